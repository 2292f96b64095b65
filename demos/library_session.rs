use std::error::Error;

use disneycards::render::SurfaceKind;
use disneycards::runner::{Gesture, Options, Session};
use disneycards::source::{HttpOptions, HttpSource};
use disneycards::store::MemoryStore;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    let source = HttpSource::new(&HttpOptions::default())?;
    let mut session = Session::new(
        Options {
            page_size: 10,
            ..Options::default()
        },
        source,
        MemoryStore::new(),
    )?;

    let report = session.start().await?;
    println!("Loaded: {}", report.rendered);
    if let Some(error) = report.error {
        println!("Error: {error}");
        return Ok(());
    }

    let first = session
        .state()
        .surface(SurfaceKind::Primary)
        .cards()
        .first()
        .map(|card| card.id);
    if let Some(id) = first {
        session.dispatch(Gesture::Activate(id))?;
    }

    session.search("mouse").await?;
    for card in session.state().visible().cards() {
        let marker = if card.decorated { " *" } else { "" };
        println!("{} {}{}", card.id, card.name, marker);
    }

    println!("Favourites: {}", session.state().favourites().len());
    Ok(())
}

use crate::cli::args::CliArgs;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(page_size) = args.page_size {
        if page_size == 0 {
            return Err("invalid page-size, expected positive integer".to_string());
        }
    }
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err("invalid timeout, expected positive integer".to_string());
        }
    }
    if let Some(raw) = args.search_mode.as_deref() {
        crate::search::SearchMode::parse(raw)
            .ok_or_else(|| format!("invalid --search-mode '{raw}', expected replace or swap"))?;
    }
    if let Some(raw) = args.output_format.as_deref() {
        crate::output::OutputFormat::parse(raw)
            .ok_or_else(|| format!("invalid --output-format '{raw}', expected text, json or html"))?;
    }
    if let Some(raw) = args.api_url.as_deref() {
        let parsed = reqwest::Url::parse(raw.trim())
            .map_err(|e| format!("invalid --api-url '{raw}': {e}"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(format!("invalid --api-url '{raw}': expected http or https"));
        }
    }
    if args.quiet && args.verbose > 0 {
        return Err("use either --quiet or --verbose, not both".to_string());
    }
    Ok(())
}

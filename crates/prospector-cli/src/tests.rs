use super::*;

#[test]
fn parses_research_with_adhoc_fields() {
    let cli = Cli::try_parse_from([
        "prospector-cli",
        "research",
        "--backend",
        "apify",
        "--name",
        "Ada Lovelace",
        "--website",
        "engines.example",
    ])
    .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Commands::Research {
            backend: BackendKind::ActorPlatform,
            id: None,
            name: Some(ref n),
            website: Some(_),
            ..
        } if n == "Ada Lovelace"
    ));
}

#[test]
fn research_defaults_to_browser_backend() {
    let cli = Cli::try_parse_from(["prospector-cli", "research", "--id", "p-1"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Research {
            backend: BackendKind::Browser,
            id: Some(ref id),
            ..
        } if id == "p-1"
    ));
}

#[test]
fn research_id_conflicts_with_adhoc_fields() {
    assert!(Cli::try_parse_from(["prospector-cli", "research", "--id", "p-1", "--name", "Ada"]).is_err());
}

#[test]
fn unknown_backend_is_rejected() {
    assert!(Cli::try_parse_from(["prospector-cli", "research", "--backend", "selenium"]).is_err());
}

#[test]
fn parses_scrape_type() {
    let cli = Cli::try_parse_from([
        "prospector-cli",
        "scrape",
        "--type",
        "linkedin",
        "https://www.linkedin.com/in/ada",
    ])
    .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Scrape {
            kind: ScrapeKind::Linkedin,
            ..
        }
    ));
    assert!(Cli::try_parse_from(["prospector-cli", "scrape", "--type", "pdf", "x"]).is_err());
}

#[test]
fn parses_places_filters() {
    let cli = Cli::try_parse_from([
        "prospector-cli",
        "places",
        "bakery",
        "--location",
        "Austin, TX",
        "--has-website",
        "--max-reviews",
        "10",
    ])
    .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Places {
            has_website: true,
            max_reviews: Some(10),
            max_results: None,
            ..
        }
    ));
}

#[test]
fn parses_status() {
    let cli = Cli::try_parse_from(["prospector-cli", "status"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Commands::Status));
}

//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Clone, Default, PartialEq, Eq, Parser)]
#[command(name = "gradmap")]
#[command(about = "Import a degree audit onto a curriculum flowchart")]
pub struct Args {
    /// Exported audit report (HTML or plain text)
    pub audit: PathBuf,
    /// Curriculum nodes as JSON
    #[arg(required_unless_present = "evidence_only")]
    pub curriculum: Option<PathBuf>,
    /// Currently displayed label/note state (JSON)
    #[arg(long)]
    pub state: Option<PathBuf>,
    /// Note template for the program (TOML)
    #[arg(long)]
    pub notes: Option<PathBuf>,
    /// Program whose note template to use from the notes dir
    #[arg(long)]
    pub program: Option<String>,
    /// Config file instead of ~/.gradmap/config.toml
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Print extracted evidence instead of reconciling
    #[arg(long = "evidence")]
    pub evidence_only: bool,
}

#[cfg(test)]
mod tests {
    use std::iter;
    use std::path::PathBuf;

    use clap::Parser;
    use clap::error::ErrorKind;

    use super::Args;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(iter::once("gradmap").chain(args.iter().copied()))
    }

    #[test]
    fn parses_positional_and_options() {
        let args = parse(&[
            "audit.html",
            "cpsc.json",
            "--state",
            "state.json",
            "--program",
            "cpsc",
        ])
        .unwrap();
        assert_eq!(
            args,
            Args {
                audit: PathBuf::from("audit.html"),
                curriculum: Some(PathBuf::from("cpsc.json")),
                state: Some(PathBuf::from("state.json")),
                program: Some("cpsc".to_string()),
                ..Args::default()
            }
        );
    }

    #[test]
    fn evidence_mode_does_not_need_curriculum() {
        let args = parse(&["audit.txt", "--evidence"]).unwrap();
        assert!(args.evidence_only);
        assert_eq!(args.curriculum, None);
    }

    #[test]
    fn rejects_missing_and_unknown_arguments() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["audit.txt"]).is_err());
        assert!(parse(&["audit.txt", "c.json", "--bogus"]).is_err());
        assert!(parse(&["audit.txt", "c.json", "--state"]).is_err());
        assert!(parse(&["audit.txt", "c.json", "extra"]).is_err());
    }

    #[test]
    fn help_is_reported_as_display_help() {
        let err = parse(&["--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    }
}

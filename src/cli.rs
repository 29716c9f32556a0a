use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum Frequency {
    /// Keep polling until the final log is uploaded or a stop is requested
    #[default]
    Forever,
    /// One planning and transfer attempt, then exit
    Once,
}

#[derive(Parser, Debug)]
#[command(name = "eventlog-sync")]
#[command(about = "Upload finalized job event logs to object storage")]
#[command(version)]
pub struct Args {
    /// Local directory the job writes its event logs to
    pub source_dir: PathBuf,

    /// Remote destination, e.g. spark:my-bucket/event-logs
    pub target_dir: String,

    #[arg(value_enum, default_value_t = Frequency::Forever)]
    pub frequency: Frequency,

    /// Port for the /stop and /status control endpoints
    pub port: Option<u16>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_forever() {
        let args = Args::try_parse_from(["eventlog-sync", "/var/log/spark", "spark:bucket"]).unwrap();
        assert_eq!(args.frequency, Frequency::Forever);
        assert_eq!(args.port, None);
        assert_eq!(args.target_dir, "spark:bucket");
    }

    #[test]
    fn test_full_positional_form() {
        let args = Args::try_parse_from([
            "eventlog-sync",
            "/var/log/spark",
            "spark:bucket",
            "forever",
            "23174",
        ])
        .unwrap();
        assert_eq!(args.frequency, Frequency::Forever);
        assert_eq!(args.port, Some(23174));
    }

    #[test]
    fn test_once() {
        let args = Args::try_parse_from(["eventlog-sync", "/logs", "spark:b", "once"]).unwrap();
        assert_eq!(args.frequency, Frequency::Once);
    }

    #[test]
    fn test_rejects_unknown_frequency() {
        assert!(Args::try_parse_from(["eventlog-sync", "/logs", "spark:b", "hourly"]).is_err());
    }

    #[test]
    fn test_requires_target() {
        assert!(Args::try_parse_from(["eventlog-sync", "/logs"]).is_err());
    }
}

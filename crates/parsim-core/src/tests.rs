//! Unit tests for parsim-core primitives.

#[cfg(test)]
mod ids {
    use crate::PartitionId;

    #[test]
    fn index_roundtrip() {
        let id = PartitionId(3);
        assert_eq!(id.index(), 3);
        assert_eq!(PartitionId::try_from(3usize).unwrap(), id);
    }

    #[test]
    fn ordering() {
        assert!(PartitionId(0) < PartitionId(1));
    }

    #[test]
    fn display() {
        assert_eq!(PartitionId(7).to_string(), "P7");
    }
}

#[cfg(test)]
mod time {
    use crate::SimTime;

    #[test]
    fn comparisons() {
        assert!(SimTime::at(10.0) < SimTime::at(10.5));
        assert!(SimTime::at(1000.0) >= SimTime::at(1000.0));
        assert_eq!(SimTime::ZERO.secs(), 0.0);
    }

    #[test]
    fn display() {
        assert_eq!(SimTime::at(12.0).to_string(), "12s");
    }
}

#[cfg(test)]
mod config {
    use std::path::PathBuf;

    use crate::{PartitionId, RunConfig};

    fn base() -> RunConfig {
        RunConfig {
            host: "localhost".into(),
            base_port: 8813,
            config_path: PathBuf::from("sim.sumocfg"),
            gui: false,
            partitions: 2,
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(base().validate().is_ok());
    }

    #[test]
    fn single_partition_rejected() {
        let cfg = RunConfig { partitions: 1, ..base() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn port_overflow_rejected() {
        let cfg = RunConfig { base_port: u16::MAX - 1, partitions: 4, ..base() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn port_for_partition() {
        let cfg = base();
        assert_eq!(cfg.port_for(PartitionId(0)), 8813);
        assert_eq!(cfg.port_for(PartitionId(1)), 8814);
    }
}

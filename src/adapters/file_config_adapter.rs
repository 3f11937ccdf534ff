//! INI file configuration adapter.

use crate::domain::error::TradeflowError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TradeflowError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config.load(path).map_err(|reason| TradeflowError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, TradeflowError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| TradeflowError::ConfigParse {
                file: "<string>".into(),
                reason,
            })?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_deref()
            .and_then(Self::parse_bool)
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_sections() {
        let content = r#"
[data]
prices = data/prices.csv

[backtest]
budget = 10000.0

[strategy]
kind = buy_and_hold
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("data", "prices"),
            Some("data/prices.csv".to_string())
        );
        assert_eq!(
            adapter.get_string("strategy", "kind"),
            Some("buy_and_hold".to_string())
        );
        assert_eq!(adapter.get_double("backtest", "budget", 0.0), 10000.0);
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[backtest]\nbudget = 100\n").unwrap();
        assert_eq!(adapter.get_string("backtest", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_int_and_defaults() {
        let adapter =
            FileConfigAdapter::from_string("[strategy]\nn_trades = 5\nmax_orders = abc\n")
                .unwrap();
        assert_eq!(adapter.get_int("strategy", "n_trades", 0), 5);
        assert_eq!(adapter.get_int("strategy", "max_orders", 42), 42);
        assert_eq!(adapter.get_int("strategy", "missing", 7), 7);
    }

    #[test]
    fn get_double_and_defaults() {
        let adapter =
            FileConfigAdapter::from_string("[data]\nvolatility = 0.02\nseed = abc\n").unwrap();
        assert_eq!(adapter.get_double("data", "volatility", 0.0), 0.02);
        assert_eq!(adapter.get_double("data", "seed", 9.5), 9.5);
        assert_eq!(adapter.get_double("data", "missing", 1.5), 1.5);
    }

    #[test]
    fn get_bool_values() {
        let adapter = FileConfigAdapter::from_string(
            "[backtest]\na = true\nb = yes\nc = 1\nd = false\ne = no\nf = 0\ng = maybe\n",
        )
        .unwrap();
        assert!(adapter.get_bool("backtest", "a", false));
        assert!(adapter.get_bool("backtest", "b", false));
        assert!(adapter.get_bool("backtest", "c", false));
        assert!(!adapter.get_bool("backtest", "d", true));
        assert!(!adapter.get_bool("backtest", "e", true));
        assert!(!adapter.get_bool("backtest", "f", true));
        assert!(adapter.get_bool("backtest", "g", true));
        assert!(!adapter.get_bool("backtest", "missing", false));
    }

    #[test]
    fn get_list_splits_and_trims() {
        let adapter =
            FileConfigAdapter::from_string("[strategy]\nweights = A0:0.5, A1:0.5 ,,\n").unwrap();
        assert_eq!(
            adapter.get_list("strategy", "weights"),
            vec!["A0:0.5".to_string(), "A1:0.5".to_string()]
        );
        assert!(adapter.get_list("strategy", "missing").is_empty());
    }

    #[test]
    fn values_keep_case() {
        let adapter = FileConfigAdapter::from_string("[strategy]\nweights = BHP:1\n").unwrap();
        assert_eq!(adapter.get_list("strategy", "weights"), vec!["BHP:1".to_string()]);
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[report]\noutput_dir = /tmp/out\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("report", "output_dir"),
            Some("/tmp/out".to_string())
        );
    }

    #[test]
    fn from_file_missing_is_parse_error() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/config.ini");
        assert!(matches!(result, Err(TradeflowError::ConfigParse { .. })));
    }
}

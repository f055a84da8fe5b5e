use crate::error::ShellError;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct Flags {
    flags: BTreeMap<&'static str, Flag>,
}

#[derive(Debug, Clone)]
pub struct Flag {
    pub short: &'static str,
    pub long: &'static str,
    pub description: &'static str,
    pub takes_value: bool,
    pub value: Option<String>,
}

impl Default for Flags {
    fn default() -> Self {
        Self::new()
    }
}

impl Flags {
    pub fn new() -> Self {
        let mut flags = BTreeMap::new();
        let mut add = |name: &'static str,
                       short: &'static str,
                       long: &'static str,
                       description: &'static str,
                       takes_value: bool| {
            flags.insert(
                name,
                Flag {
                    short,
                    long,
                    description,
                    takes_value,
                    value: None,
                },
            );
        };

        add("help", "-h", "--help", "Print this help message", false);
        add("version", "-v", "--version", "Show version information", false);
        add("config", "-c", "--config", "Read settings from this file instead of ~/.myshellrc", true);
        add("quiet", "-q", "--quiet", "Only print errors", false);
        add("debug", "-d", "--debug", "Enable debug logging", false);

        Flags { flags }
    }

    pub fn parse(&mut self, args: &[String]) -> Result<(), ShellError> {
        let mut args = args.iter();
        while let Some(arg) = args.next() {
            let flag = self
                .flags
                .values_mut()
                .find(|flag| arg == flag.short || arg == flag.long)
                .ok_or_else(|| ShellError::FlagError(format!("unknown option {}", arg)))?;

            flag.value = if flag.takes_value {
                let value = args
                    .next()
                    .ok_or_else(|| ShellError::FlagError(format!("Flag {} requires a value", arg)))?;
                Some(value.clone())
            } else {
                Some("true".to_string())
            };
        }
        Ok(())
    }

    pub fn is_set(&self, name: &str) -> bool {
        self.flags
            .get(name)
            .and_then(|f| f.value.as_ref())
            .is_some()
    }

    pub fn get_value(&self, name: &str) -> Option<&String> {
        self.flags.get(name).and_then(|f| f.value.as_ref())
    }

    pub fn print_help(&self) {
        println!("Usage: myshell [OPTIONS]");
        println!("\nOptions:");
        for flag in self.flags.values() {
            let long = if flag.takes_value {
                format!("{} <path>", flag.long)
            } else {
                flag.long.to_string()
            };
            println!("  {}, {:<18} {}", flag.short, long, flag.description);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_short_and_long() -> Result<(), ShellError> {
        let mut flags = Flags::new();
        flags.parse(&args(&["-q", "--debug", "--config", "/tmp/rc"]))?;
        assert!(flags.is_set("quiet"));
        assert!(flags.is_set("debug"));
        assert!(!flags.is_set("help"));
        assert_eq!(flags.get_value("config").map(String::as_str), Some("/tmp/rc"));
        Ok(())
    }

    #[test]
    fn test_missing_value() {
        let mut flags = Flags::new();
        assert!(matches!(
            flags.parse(&args(&["-c"])),
            Err(ShellError::FlagError(_))
        ));
    }

    #[test]
    fn test_unknown_flag() {
        let mut flags = Flags::new();
        assert!(matches!(
            flags.parse(&args(&["--frobnicate"])),
            Err(ShellError::FlagError(_))
        ));
    }
}

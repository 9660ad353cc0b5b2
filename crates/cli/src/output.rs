use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OutputFormat {
    Json,
    Pretty,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "pretty" => Ok(OutputFormat::Pretty),
            _ => Err(format!(
                "Invalid format: {}. Valid options are: json, pretty",
                s
            )),
        }
    }
}

impl OutputFormat {
    pub fn render<T: Serialize>(&self, value: &T) -> anyhow::Result<String> {
        let rendered = match self {
            OutputFormat::Json => serde_json::to_string_pretty(value)?,
            OutputFormat::Pretty => serde_yml::to_string(value)?,
        };
        Ok(rendered)
    }

    /// Print the value to stdout
    pub fn print<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        println!("{}", self.render(value)?.trim_end());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_format() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("pretty".parse::<OutputFormat>(), Ok(OutputFormat::Pretty));
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_render() {
        let value = json!({"id": "cus_123"});
        let rendered = OutputFormat::Json.render(&value).unwrap();
        assert!(rendered.contains("\"id\": \"cus_123\""));
        let rendered = OutputFormat::Pretty.render(&value).unwrap();
        assert_eq!(rendered.trim_end(), "id: cus_123");
    }
}

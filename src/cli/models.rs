//! Model listing

use std::io::{self, Write};

use crate::core::config::Config;
use crate::core::params::MODELS;

pub fn list_models<W: Write>(config: &Config, out: &mut W) -> io::Result<()> {
    let default_model = config.default_model();

    writeln!(out, "🤖 Available Models")?;
    writeln!(out, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
    for model in MODELS {
        if model == default_model {
            writeln!(out, "  • {model} (default)")?;
        } else {
            writeln!(out, "  • {model}")?;
        }
    }
    writeln!(out)?;
    writeln!(out, "💡 Change the default with: playground set default-model <MODEL>")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(config: &Config) -> String {
        let mut out = Vec::new();
        list_models(config, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn first_model_is_default_without_config() {
        let listing = render(&Config::default());
        assert!(listing.contains("  • llama-3.1-8b-instant (default)\n"));
        assert!(listing.contains("  • openai/gpt-oss-120b\n"));
        assert_eq!(listing.matches("(default)").count(), 1);
    }

    #[test]
    fn configured_default_is_marked() {
        let config = Config {
            default_model: Some("openai/gpt-oss-20b".into()),
            ..Default::default()
        };
        let listing = render(&config);
        assert!(listing.contains("  • openai/gpt-oss-20b (default)\n"));
        assert!(listing.contains("  • llama-3.1-8b-instant\n"));
    }
}

//! `lbx generate`: print a password without storing it.

use anyhow::Result;
use console::style;

use lockbox_infra::crypto::generator;
use lockbox_types::generator::GeneratorOptions;

/// Flags of `lbx generate`, already inverted into the positive form.
#[derive(Debug, Clone)]
pub struct GenerateArgs {
    pub length: usize,
    pub upper: bool,
    pub lower: bool,
    pub digits: bool,
    pub symbols: bool,
    pub exclude_ambiguous: bool,
    pub strong: bool,
}

impl GenerateArgs {
    fn options(&self) -> GeneratorOptions {
        if self.strong {
            return GeneratorOptions {
                length: self.length,
                exclude_ambiguous: self.exclude_ambiguous,
                ..Default::default()
            };
        }
        GeneratorOptions {
            length: self.length,
            use_upper: self.upper,
            use_lower: self.lower,
            use_digits: self.digits,
            use_symbols: self.symbols,
            exclude_ambiguous: self.exclude_ambiguous,
        }
    }
}

pub fn generate_password(args: &GenerateArgs, json: bool, quiet: bool) -> Result<()> {
    let options = args.options();
    let password = if args.strong {
        generator::generate_strong_with(options.length, options.exclude_ambiguous)?
    } else {
        generator::generate(&options)?
    };
    let entropy = generator::estimate_entropy_bits(&options);

    if json {
        println!(
            "{}",
            serde_json::json!({
                "password": password,
                "length": options.length,
                "entropy_bits": entropy,
            })
        );
    } else if quiet {
        println!("{password}");
    } else {
        println!();
        println!("  {}", style(&password).yellow().bold());
        println!(
            "  {}",
            style(format!("{} characters, ~{entropy:.0} bits of entropy", options.length)).dim()
        );
        println!();
    }

    Ok(())
}

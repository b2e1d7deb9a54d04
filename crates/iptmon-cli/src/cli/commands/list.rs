use anyhow::Result;
use iptmon_core::config::Config;
use iptmon_core::error::StartupError;
use iptmon_core::format::format_magnitude;
use iptmon_core::listing::CounterRecord;
use iptmon_core::selector::CounterSelector;
use iptmon_core::source::IptablesCommand;

pub fn run(config: &Config) -> Result<()> {
    let command = IptablesCommand::new(&config.iptables, config.table.clone(), &config.chain);
    let records = CounterSelector::new(command).records();
    if records.is_empty() {
        return Err(StartupError::NoRules {
            chain: config.chain.clone(),
        }
        .into());
    }
    print!("{}", render(&records));
    Ok(())
}

fn render(records: &[CounterRecord]) -> String {
    let mut out = format!("{:>4}  {:>12}  {:>12}  RULE\n", "#", "PACKETS", "BYTES");
    for record in records {
        out.push_str(&format!(
            "{:>4}  {:>12}  {:>12}  {}\n",
            record.position,
            record.packets,
            format_magnitude(record.bytes as f64, "B"),
            record.raw_line
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use iptmon_core::listing::parse_listing;

    use super::*;

    #[test]
    fn test_render_numbers_rules() {
        let records = parse_listing("-P INPUT ACCEPT\n-A INPUT -c 3 2048 -j ACCEPT\n");
        let text = render(&records);
        let lines: Vec<&str> = text.lines().collect();

        assert!(text.ends_with('\n'));
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("RULE"));
        assert_eq!(
            lines[1],
            "   1             3       2.00 KB  -A INPUT -c 3 2048 -j ACCEPT"
        );
    }
}

use mdnsd_domain::name::split_first_label;

/// Next candidate after a name conflict: the first label gets a numeric
/// suffix, `host` → `host-2`, `host-2` → `host-3`.
pub fn next_name(name: &str) -> String {
    let (first, rest) = split_first_label(name);

    let renamed = match first.rsplit_once('-') {
        Some((base, n)) if !base.is_empty() && is_counter(n) => match n.parse::<u32>() {
            Ok(n) => format!("{}-{}", base, n.saturating_add(1)),
            Err(_) => format!("{}-2", first),
        },
        _ => format!("{}-2", first),
    };

    match rest {
        Some(rest) => format!("{}.{}", renamed, rest),
        None => renamed,
    }
}

fn is_counter(s: &str) -> bool {
    !s.is_empty() && !s.starts_with('0') && s.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_conflict_appends_two() {
        assert_eq!(next_name("printer.local"), "printer-2.local");
        assert_eq!(next_name("printer"), "printer-2");
    }

    #[test]
    fn test_counter_increments() {
        assert_eq!(next_name("printer-2.local"), "printer-3.local");
        assert_eq!(next_name("printer-19.local"), "printer-20.local");
    }

    #[test]
    fn test_non_counter_suffix_kept() {
        assert_eq!(next_name("my-printer.local"), "my-printer-2.local");
        assert_eq!(next_name("-5.local"), "-5-2.local");
        assert_eq!(next_name("host-05.local"), "host-05-2.local");
    }

    #[test]
    fn test_service_instance() {
        assert_eq!(
            next_name("Office Printer._ipp._tcp.local"),
            "Office Printer-2._ipp._tcp.local"
        );
        assert_eq!(
            next_name("My\\.Printer._ipp._tcp.local"),
            "My\\.Printer-2._ipp._tcp.local"
        );
    }
}

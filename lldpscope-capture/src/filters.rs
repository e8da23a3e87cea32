//! BPF filter expressions used by the LLDP receiver

/// LLDP frames, untagged
pub fn lldp_filter() -> String {
    "ether proto 0x88cc".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lldp_filter() {
        assert_eq!(lldp_filter(), "ether proto 0x88cc");
    }
}

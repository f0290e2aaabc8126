use sysinfo::System;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Currently available system memory in MB, or `None` if the platform
/// does not report it
pub fn available_memory_mb() -> Option<u64> {
    let mut sys = System::new();
    sys.refresh_memory();
    match sys.available_memory() {
        0 => None,
        bytes => Some(bytes / BYTES_PER_MB),
    }
}

/// Advisory warning when available memory is below `threshold_mb`
pub fn low_memory_warning(available_mb: Option<u64>, threshold_mb: u64) -> Option<String> {
    let available = available_mb?;
    if available >= threshold_mb {
        return None;
    }
    Some(format!(
        "Low system memory detected ({available} MB available). Processing large images may fail."
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warns_below_threshold() {
        let warning = low_memory_warning(Some(120), 500).unwrap();
        assert!(warning.contains("120 MB"));
    }

    #[test]
    fn silent_at_or_above_threshold() {
        assert!(low_memory_warning(Some(500), 500).is_none());
        assert!(low_memory_warning(Some(8000), 500).is_none());
    }

    #[test]
    fn silent_when_unknown() {
        assert!(low_memory_warning(None, 500).is_none());
    }
}

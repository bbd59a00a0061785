//! Browser launch flags

use crate::config::DynamicConfig;

/// Window size every rendering browser starts with
pub const DEFAULT_WINDOW_SIZE: &str = "1920,1080";

/// Builds the ordered launch flags for the rendering browser
///
/// Starts from the fixed defaults (`--headless`, `--disable-gpu`,
/// `--window-size`, `--ignore-certificate-errors`, `--user-agent`). Each
/// configured flag is split into `key[=value]`; a key that matches a default
/// replaces that default in place, any other flag is appended in configured
/// order.
///
/// # Example
///
/// ```
/// use ripple_parse::config::DynamicConfig;
/// use ripple_parse::render::launch_flags;
///
/// let config = DynamicConfig {
///     render_engine_launch_flags: vec!["--window-size=800,600".into(), "--mute-audio".into()],
///     ..DynamicConfig::default()
/// };
/// let flags = launch_flags(&config);
/// assert_eq!(flags[2], "--window-size=800,600");
/// assert_eq!(flags.last().unwrap(), "--mute-audio");
/// ```
pub fn launch_flags(config: &DynamicConfig) -> Vec<String> {
    let mut flags: Vec<(String, Option<String>)> = vec![
        ("--headless".to_string(), None),
        ("--disable-gpu".to_string(), None),
        (
            "--window-size".to_string(),
            Some(DEFAULT_WINDOW_SIZE.to_string()),
        ),
        ("--ignore-certificate-errors".to_string(), None),
        ("--user-agent".to_string(), Some(config.user_agent.clone())),
    ];

    for raw in &config.render_engine_launch_flags {
        let (key, value) = split_flag(raw);
        match flags.iter_mut().find(|(existing, _)| *existing == key) {
            Some(slot) => slot.1 = value,
            None => flags.push((key, value)),
        }
    }

    flags
        .into_iter()
        .map(|(key, value)| match value {
            Some(value) => format!("{}={}", key, value),
            None => key,
        })
        .collect()
}

fn split_flag(raw: &str) -> (String, Option<String>) {
    let raw = raw.trim();
    match raw.split_once('=') {
        Some((key, value)) => (key.to_string(), Some(value.to_string())),
        None => (raw.to_string(), None),
    }
}

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Whether debug output was asked for.
///
/// `--debug` always wins. Otherwise `LANDO_DEBUG` enables it unless empty,
/// `0` or `false`, and `DEBUG` enables it when it mentions `lando`.
pub fn debug_enabled(flag: bool, lando_debug: Option<&str>, debug: Option<&str>) -> bool {
    if flag {
        return true;
    }
    if let Some(value) = lando_debug {
        let value = value.trim();
        if !value.is_empty() && value != "0" && !value.eq_ignore_ascii_case("false") {
            return true;
        }
    }
    debug.is_some_and(|value| value.contains("lando"))
}

/// Install a compact stderr subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `lando=debug` when debugging and
/// `warn` when not.
pub fn init(debug: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .compact();

    let fallback = if debug { "lando=debug" } else { "warn" };
    let filter_layer = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(fallback))?;

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(true, None, None, true)]
    #[case(false, None, None, false)]
    #[case(false, Some("1"), None, true)]
    #[case(false, Some("0"), None, false)]
    #[case(false, Some("FALSE"), None, false)]
    #[case(false, Some(""), None, false)]
    #[case(false, None, Some("lando*"), true)]
    #[case(false, None, Some("express"), false)]
    fn test_debug_enabled(
        #[case] flag: bool,
        #[case] lando_debug: Option<&str>,
        #[case] debug: Option<&str>,
        #[case] expected: bool,
    ) {
        assert_eq!(debug_enabled(flag, lando_debug, debug), expected);
    }

    #[test]
    fn test_logging_init() {
        // Only the first init in a process succeeds.
        let _ = init(false);
        tracing::warn!("This is a warning message");
    }
}

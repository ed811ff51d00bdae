//! Panic and error-report hooks.
//!
//! The terminal has to leave raw mode before anything is printed, so the
//! panic hook tears the [`crate::tui::Tui`] down first, then defers to
//! better-panic in debug builds and human-panic in release builds.

use color_eyre::Result;
use tracing::error;

pub fn init() -> Result<()> {
    let (panic_hook, eyre_hook) = color_eyre::config::HookBuilder::default()
        .panic_section("The terminal state has been restored; the log file has the details.")
        .capture_span_trace_by_default(false)
        .display_location_section(false)
        .display_env_section(false)
        .try_into_hooks()?;
    eyre_hook.install()?;

    std::panic::set_hook(Box::new(move |panic_info| {
        if let Ok(mut tui) = crate::tui::Tui::new() {
            if let Err(err) = tui.exit() {
                error!("unable to restore the terminal: {err:?}");
            }
        }

        let report = panic_hook.panic_report(panic_info).to_string();
        error!("{}", strip_ansi_escapes::strip_str(&report));

        #[cfg(debug_assertions)]
        better_panic::Settings::auto()
            .most_recent_first(false)
            .lineno_suffix(true)
            .verbosity(better_panic::Verbosity::Full)
            .create_panic_handler()(panic_info);

        #[cfg(not(debug_assertions))]
        {
            use human_panic::{handle_dump, metadata, print_msg};
            let meta = metadata!();
            let dump = handle_dump(&meta, panic_info);
            print_msg(dump, &meta).expect("printing the crash report failed");
            eprintln!("{report}");
        }

        std::process::exit(libc::EXIT_FAILURE);
    }));

    Ok(())
}

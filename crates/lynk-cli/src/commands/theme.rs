//! Theme commands: show or toggle the persisted dark-mode flag.

use lynk_core::prefs::PreferenceStore;

use crate::cli::ThemeCommands;
use crate::config::preferences_path;
use crate::error::CliError;

pub fn run_theme(command: ThemeCommands) -> Result<(), CliError> {
    let mut preferences = PreferenceStore::load(preferences_path())?;

    match command {
        ThemeCommands::Show => {
            println!("{}", theme_label(preferences.dark_mode()));
            Ok(())
        }
        ThemeCommands::Toggle => {
            let dark_mode = preferences.toggle_dark_mode()?;
            println!("{}", theme_label(dark_mode));
            Ok(())
        }
    }
}

const fn theme_label(dark_mode: bool) -> &'static str {
    if dark_mode {
        "dark"
    } else {
        "light"
    }
}

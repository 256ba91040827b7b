// SPDX-License-Identifier: GPL-3.0-or-later

mod app;
mod panels;
mod widgets;

use clap::Parser;
use std::path::PathBuf;

use crate::app::AppModel;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Event file to read and write
    #[arg(short, long, value_name = "PATH", default_value = "events.json")]
    events: PathBuf,
    /// File remembering the last shown month, view mode and theme
    #[arg(short, long, value_name = "PATH", default_value = "settings.json")]
    settings: PathBuf,
    /// Use the dark theme for this run without changing the stored setting
    #[arg(long)]
    dark: bool,
}

fn main() -> iced::Result {
    env_logger::init();

    // Parse command line arguments
    let args = Args::parse();

    AppModel::create(args).run()
}

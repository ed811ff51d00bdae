use clap::Parser;

#[derive(Parser)]
#[command(name = "studio", version, about = "Channel onboarding form demo")]
pub struct Cli {
    /// Ticks per second; overrides the configured value
    #[arg(short, long, value_name = "FLOAT")]
    pub tick_rate: Option<f64>,

    /// Frames per second; overrides the configured value
    #[arg(short, long, value_name = "FLOAT")]
    pub frame_rate: Option<f64>,
}

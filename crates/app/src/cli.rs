use clap::{Parser, ValueEnum};

use snoosync_core::Timeline;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[arg(long)]
    pub subreddit: Option<String>,
    #[arg(long)]
    pub limit: Option<u32>,
    #[arg(long)]
    pub timeline: Option<TimelineArg>,
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TimelineArg {
    Hot,
    New,
    Top,
    Rising,
}

impl From<TimelineArg> for Timeline {
    fn from(value: TimelineArg) -> Self {
        match value {
            TimelineArg::Hot => Timeline::Hot,
            TimelineArg::New => Timeline::New,
            TimelineArg::Top => Timeline::Top,
            TimelineArg::Rising => Timeline::Rising,
        }
    }
}

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "unenroll")]
#[command(bin_name = "unenroll")]
#[command(version)]
#[command(about = "Review your course enrollments and unenroll with an optional reason")]
pub struct Cli {
    #[arg(
        long,
        global = true,
        help = "Write a diagnostics log under ~/.config/unenroll/diagnostics"
    )]
    pub diagnostics: bool,
    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "Enrollment store to use instead of the configured one"
    )]
    pub store: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[command(about = "Print the reasons offered when unenrolling")]
    Reasons,
    #[command(about = "Print current enrollments")]
    List,
    #[command(about = "Enroll in a course")]
    Enroll {
        #[arg(value_name = "COURSE_ID")]
        course_id: String,
        #[arg(value_name = "TITLE")]
        title: String,
    },
}

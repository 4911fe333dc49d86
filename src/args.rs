use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Clone, Debug, Parser)]
#[clap(infer_subcommands = true, version, about = "Builds static sites from markdown")]
pub struct Args {
    /// More output per occurrence (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Command {
    /// Builds the site
    Build(BuildArgs),
}

#[derive(Clone, Debug, Parser)]
pub struct BuildArgs {
    /// The site directory
    #[clap(default_value = ".")]
    pub directory: PathBuf,

    /// Config file to use instead of the one in the site directory
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Where to write the site, replaces `publishDir`
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Publish pages marked as draft
    #[arg(short = 'D', long)]
    pub drafts: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_build_flags() {
        let args = Args::parse_from(["folio", "-vv", "b", "site", "--output", "out", "-D"]);
        assert_eq!(args.verbose, 2);
        let Command::Build(build) = args.command;
        assert_eq!(build.directory, PathBuf::from("site"));
        assert_eq!(build.output, Some(PathBuf::from("out")));
        assert!(build.config.is_none());
        assert!(build.drafts);
    }

    #[test]
    fn builds_the_current_dir_by_default() {
        let args = Args::parse_from(["folio", "build"]);
        let Command::Build(build) = args.command;
        assert_eq!(build.directory, PathBuf::from("."));
        assert_eq!(args.verbose, 0);
    }
}

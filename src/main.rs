use anyhow::Result;
use clap::{Parser, Subcommand};
use mingit::areas::repository::Repository;
use mingit::artifacts::objects::object_type::ObjectType;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "mingit",
    version,
    about = "A minimal git-compatible storage core",
    long_about = "A minimal implementation of git's storage layer: \
    the object database, the staging index, tree building and reference \
    resolution. Not a git replacement, a way to see how the plumbing fits together."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(name = "init", about = "Initialize a new repository")]
    Init {
        #[arg(index = 1, help = "The path to the repository")]
        path: Option<PathBuf>,
    },
    #[command(
        name = "hash-object",
        about = "Hash a file and optionally write it to the object database"
    )]
    HashObject {
        #[arg(short, long, help = "Write the object to the object database")]
        write: bool,
        #[arg(index = 1)]
        file: PathBuf,
    },
    #[command(name = "cat-file", about = "Print the content of an object")]
    CatFile {
        #[arg(
            short = 't',
            long = "type",
            help = "Print the object's type instead of its content"
        )]
        type_only: bool,
        #[arg(index = 1, help = "Object name: HEAD, hash prefix, tag or branch")]
        name: String,
    },
    #[command(name = "add", about = "Stage files for the next commit")]
    Add {
        #[arg(index = 1, required = true, help = "Files or directories to stage")]
        paths: Vec<PathBuf>,
    },
    #[command(name = "commit", about = "Create a new commit from the staged index")]
    Commit {
        #[arg(short, long, help = "The commit message")]
        message: String,
    },
    #[command(name = "ls-files", about = "List staged paths")]
    LsFiles,
    #[command(name = "log", about = "Show the first-parent history of HEAD")]
    Log,
    #[command(
        name = "branch",
        about = "List branches, or create one at the current HEAD"
    )]
    Branch {
        #[arg(short, long, help = "Point HEAD at the named branch")]
        switch: bool,
        #[arg(index = 1, help = "The branch name")]
        name: Option<String>,
    },
    #[command(name = "show-ref", about = "List references with their resolved ids")]
    ShowRef,
    #[command(name = "ls-tree", about = "List the contents of a tree object")]
    LsTree {
        #[arg(short, long, help = "Recurse into subtrees")]
        recursive: bool,
        #[arg(index = 1, help = "Tree-ish name to list")]
        name: String,
    },
    #[command(name = "rev-parse", about = "Resolve a name to an object id")]
    RevParse {
        #[arg(long = "type", help = "Expected object type: blob, tree, commit or tag")]
        object_type: Option<String>,
        #[arg(index = 1)]
        name: String,
    },
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Init { path } => {
            let path = match path {
                Some(path) => path.clone(),
                None => std::env::current_dir()?,
            };
            let repository = Repository::init(&path)?;
            println!(
                "Initialized empty repository in {}",
                repository.gitdir().display()
            );
        }
        Commands::HashObject { write, file } => {
            let repository = Repository::discover(&std::env::current_dir()?)?;
            let object_id = repository.hash_object(file, *write)?;
            println!("{object_id}");
        }
        Commands::CatFile { type_only, name } => {
            let repository = Repository::discover(&std::env::current_dir()?)?;
            if *type_only {
                println!("{}", repository.object_type_of(name)?);
            } else {
                print!("{}", repository.cat_file(name)?);
            }
        }
        Commands::Add { paths } => {
            let repository = Repository::discover(&std::env::current_dir()?)?;
            repository.add(paths)?;
        }
        Commands::Commit { message } => {
            let repository = Repository::discover(&std::env::current_dir()?)?;
            let commit_id = repository.commit(message)?;
            println!("{commit_id}");
        }
        Commands::LsFiles => {
            let repository = Repository::discover(&std::env::current_dir()?)?;
            for path in repository.ls_files()? {
                println!("{}", path.display());
            }
        }
        Commands::Log => {
            let repository = Repository::discover(&std::env::current_dir()?)?;
            let history = repository.log()?;
            if !history.is_empty() {
                println!("{history}");
            }
        }
        Commands::Branch { switch, name } => {
            let repository = Repository::discover(&std::env::current_dir()?)?;
            match (name, *switch) {
                (None, _) => {
                    let branches = repository.list_branches()?;
                    if !branches.is_empty() {
                        println!("{branches}");
                    }
                }
                (Some(name), false) => repository.create_branch(name)?,
                (Some(name), true) => repository.switch_branch(name)?,
            }
        }
        Commands::ShowRef => {
            let repository = Repository::discover(&std::env::current_dir()?)?;
            let refs = repository.show_ref()?;
            if !refs.is_empty() {
                println!("{refs}");
            }
        }
        Commands::LsTree { recursive, name } => {
            let repository = Repository::discover(&std::env::current_dir()?)?;
            println!("{}", repository.ls_tree(name, *recursive)?);
        }
        Commands::RevParse { object_type, name } => {
            let repository = Repository::discover(&std::env::current_dir()?)?;
            let expected = object_type
                .as_deref()
                .map(ObjectType::try_from)
                .transpose()?;
            match repository.rev_parse(name, expected)? {
                Some(oid) => println!("{oid}"),
                None => anyhow::bail!("unable to resolve {name}"),
            }
        }
    }

    Ok(())
}

use clap::{Args, Parser, Subcommand};

use crate::api;
use crate::services::cache::{ImageCacheStore, LocalFsStore};
use crate::types::{ApiResponse, Domain};

#[derive(Parser)]
#[command(name = "heropick", version, about = "Product-image resolution (JSON only)")]
pub struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve the representative image for a product URL
    Resolve(ResolveArgs),
    #[command(subcommand)]
    Cache(CacheCmd),
}

#[derive(Args)]
struct ResolveArgs {
    /// The product page URL to resolve.
    url: String,
    /// Rotation index; bump it to surface a different high-quality candidate.
    #[arg(long, default_value_t = 0)]
    attempt: u32,
    /// Manually supplied image URL; wins outright, cached only when same-domain.
    #[arg(long = "manual-image")]
    manual_image: Option<String>,
}

#[derive(Subcommand)]
enum CacheCmd {
    Read(ReadArgs),
    Delete(DeleteArgs),
}

#[derive(Args)]
struct ReadArgs {
    target: String, // <domain> | all
}

#[derive(Args)]
struct DeleteArgs {
    target: String, // <domain> | all
    #[arg(long = "yes")]
    yes: bool,
}

pub fn run() {
    let cli = Cli::parse();
    let store = LocalFsStore::new().unwrap();

    match cli.cmd {
        Command::Resolve(args) => {
            let image = crate::runtime::block_on(async {
                let result = api::resolve_product_image(
                    &args.url,
                    args.attempt,
                    args.manual_image.as_deref(),
                )
                .await;
                api::shutdown().await;
                result
            });
            print_json(ApiResponse::ok(serde_json::json!({
                "url": args.url,
                "attempt": args.attempt,
                "image": image,
            })));
        }
        Command::Cache(cc) => cache_cmd(&store, cc),
    }
}

fn cache_cmd(store: &LocalFsStore, cc: CacheCmd) {
    match cc {
        CacheCmd::Read(ReadArgs { target }) => {
            if target == "all" {
                finish(store.list());
            } else {
                finish(store.get(&Domain::from_raw(&target)));
            }
        }
        CacheCmd::Delete(DeleteArgs { target, yes }) => {
            if !yes {
                return print_json(ApiResponse::<()>::err("refusing to delete without --yes"));
            }
            if target == "all" {
                finish(store.delete_all().map(|_| serde_json::json!({"deleted": "all"})));
            } else {
                let domain = Domain::from_raw(&target);
                finish(
                    store
                        .delete(&domain)
                        .map(|_| serde_json::json!({"deleted": domain.0})),
                );
            }
        }
    }
}

fn finish<T: serde::Serialize>(res: crate::error::Result<T>) {
    match res {
        Ok(v) => print_json(ApiResponse::ok(v)),
        Err(e) => print_json(ApiResponse::<()>::err(e.to_string())),
    }
}

fn print_json<T: serde::Serialize>(val: T) {
    // pretty JSON output
    println!("{}", serde_json::to_string_pretty(&val).unwrap());
}

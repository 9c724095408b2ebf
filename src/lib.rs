pub mod cli;
pub mod context;
pub mod conversation;
pub mod dispatcher;
pub mod models;
pub mod render;
pub mod session;

use cli::{ parse_command, Args, Command, HELP };
use context::{ NavigationHost, PageContextTracker };
use models::chat::PageContext;
use dispatcher::{ HttpTransport, RequestDispatcher };
use futures::StreamExt;
use log::info;
use render::{ banner_updates, TranscriptRenderer };
use session::{ SessionController, SubmitOutcome };
use std::error::Error;
use std::sync::Arc;
use tokio::io::{ AsyncBufReadExt, BufReader };
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;

fn spawn_transcript(session: &SessionController) -> JoinHandle<()> {
    let mut snapshots = WatchStream::new(session.subscribe());
    tokio::spawn(async move {
        let mut renderer = TranscriptRenderer::new();
        while let Some(snapshot) = snapshots.next().await {
            if let Some(text) = renderer.render(&snapshot) {
                println!("{}\n", text);
            }
        }
    })
}

fn spawn_banner(contexts: watch::Receiver<Option<PageContext>>) -> JoinHandle<()> {
    let mut banners = banner_updates(contexts);
    tokio::spawn(async move {
        while let Some(banner) = banners.next().await {
            println!("{}\n", banner);
        }
    })
}

fn submit_in_background(session: &SessionController, query: String) {
    let session = session.clone();
    tokio::spawn(async move {
        if session.submit(&query).await == SubmitOutcome::Rejected && !query.trim().is_empty() {
            println!("(still waiting for the previous answer)\n");
        }
    });
}

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("API URL: {}", args.api_url);
    info!("Request Timeout: {:?}", args.request_timeout());
    info!("Page Context Domain: {}", args.allowed_domain);
    info!("Initial Page: {:?}", args.page_url);
    info!("-------------------------");

    let transport = HttpTransport::new(&args.api_url, args.request_timeout())?;
    let dispatcher = RequestDispatcher::new(Arc::new(transport));

    let host = Arc::new(match &args.page_url {
        Some(url) => NavigationHost::with_active(url, args.page_title.as_deref()),
        None => NavigationHost::new(),
    });
    let tracker = Arc::new(PageContextTracker::new(host.clone(), &args.allowed_domain));
    let contexts = tracker.watch();
    let session = SessionController::new(dispatcher, tracker);
    let transcript = spawn_transcript(&session);
    let banner = spawn_banner(contexts);
    session.start();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_command(&line) {
            Command::Quit => {
                break;
            }
            Command::Help => println!("{}\n", HELP),
            Command::Empty => {}
            Command::Open { url, title } => host.navigate(&url, title.as_deref()),
            Command::Close => host.close(),
            Command::Suggestion(n) => {
                match session.snapshot().suggestion(n) {
                    Some(query) => submit_in_background(&session, query.to_string()),
                    None => println!("(no suggestion #{})\n", n),
                }
            }
            Command::Send(text) => submit_in_background(&session, text),
        }
    }

    info!("Session {} closing", session.id());
    session.stop();
    transcript.abort();
    banner.abort();
    Ok(())
}

//! Terminal renderings of the list and detail views.

use anyhow::Result;
use client_core::{
    FetchError, FetchMore, FileDetailController, FilesController, PendingFetch, ResourceState,
    ScrollMetrics, UsersController,
};
use shared::domain::{FileSummary, UserSummary};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::debug;

/// Rows of the pretend viewport the users list scrolls in.
const VIEWPORT_ROWS: f64 = 20.0;

type Input = Lines<BufReader<Stdin>>;

fn input() -> Input {
    BufReader::new(tokio::io::stdin()).lines()
}

async fn settle(pending: Option<PendingFetch>) {
    if let Some(pending) = pending {
        let applied = pending.settled().await;
        debug!(applied, "fetch settled");
    }
}

fn print_file_rows(files: &[FileSummary]) {
    println!("{:<16} {:<32} {}", "ID", "NAME", "ROLE");
    for file in files {
        println!("{:<16} {:<32} {}", file.id, file.name, file.role);
    }
}

fn print_user_rows(users: &[UserSummary]) {
    for user in users {
        println!("{:<16} {}", user.id, user.name);
    }
}

fn print_files(files: &FilesController) {
    match files.state() {
        ResourceState::Error(err) => println!("could not load files: {err}  [r]etry"),
        ResourceState::Ready(page) if page.items.is_empty() => println!("no files"),
        state => {
            if let Some(page) = state.data() {
                print_file_rows(&page.items);
            }
        }
    }
    println!(
        "-- page {} of {}'s files  {}  {}  [q]uit",
        files.page_number(),
        files.scope(),
        if files.can_go_prev() { "[p]rev" } else { "prev" },
        if files.can_go_next() { "[n]ext" } else { "next" },
    );
}

/// Paged file list; `n`, `p`, `r` and `q` drive it.
pub async fn browse_files(mut files: FilesController) -> Result<()> {
    let mut lines = input();
    settle(files.observe()).await;

    loop {
        print_files(&files);
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let pending = match line.trim() {
            "n" => files.go_next(),
            "p" => files.go_prev(),
            "r" => files.retry(),
            "q" => break,
            other => {
                println!("unknown command '{other}'");
                continue;
            }
        };
        settle(pending).await;
    }
    Ok(())
}

fn report(outcome: &FetchMore, users: &UsersController, shown: &mut usize) {
    match outcome {
        FetchMore::Appended { .. } => {
            let items = users.items();
            print_user_rows(&items[*shown..]);
            *shown = items.len();
        }
        FetchMore::Failed(err) => println!("could not load users: {err}  [r]etry"),
        FetchMore::Abandoned => {}
    }
    if users.is_exhausted() {
        println!("-- all {} users shown  [q]uit", users.len());
    } else {
        println!("-- {} users  <enter> scroll down  [q]uit", users.len());
    }
}

/// Infinite-scroll user list; Enter scrolls to the bottom.
pub async fn browse_users(users: UsersController) -> Result<()> {
    let mut lines = input();
    let mut shown = 0;

    if let Some(fetch) = users.initial_fetch() {
        let outcome = fetch.await?;
        report(&outcome, &users, &mut shown);
    }

    while let Some(line) = lines.next_line().await? {
        let fetch = match line.trim() {
            "" => users.on_scroll(ScrollMetrics::at_bottom(
                VIEWPORT_ROWS,
                users.len() as f64,
            )),
            "r" => users.retry(),
            "q" => break,
            other => {
                println!("unknown command '{other}'");
                continue;
            }
        };
        match fetch {
            Some(fetch) => {
                let outcome = fetch.await?;
                report(&outcome, &users, &mut shown);
            }
            None if users.is_exhausted() => println!("-- no more users"),
            None => {}
        }
    }
    Ok(())
}

/// Shows one file, creating it first when on the `:new` route.
pub async fn show_file(
    detail: &FileDetailController,
    create: Option<&str>,
) -> Result<(), FetchError> {
    settle(detail.observe()).await;
    if let ResourceState::Error(err) = detail.state() {
        return Err(err);
    }

    match (detail.shows_create_form(), create) {
        (true, Some(name)) => {
            let file = detail.create(name).await?;
            println!("created file {}", file.id);
        }
        (true, None) => {
            println!("no file at route {}; pass --create <NAME> to create one", detail.route());
            return Ok(());
        }
        (false, Some(_)) => println!("route {} already names a file", detail.route()),
        (false, None) => {}
    }

    if let Some(file) = detail.file() {
        print_file_rows(std::slice::from_ref(&file));
    }
    Ok(())
}

use std::sync::mpsc::{sync_channel, Receiver};

use clap::Parser;
use log::debug;
use procyclingstats::{Page, Row, Value};

/// Tables longer than this are shortened to their head and tail
const ABBREVIATE_OVER: usize = 13;
const HEAD_TAIL_ROWS: usize = 5;
const ELLIPSIS_ROWS: usize = 3;

#[derive(Parser)]
#[command(name = "pcs", about = "Scrape a procyclingstats.com page into structured data")]
struct Cli {
    /// Page to scrape, relative ("rider/tadej-pogacar") or absolute
    url: String,

    /// Print whole tables instead of their first and last rows
    #[arg(long)]
    fulltable: bool,

    /// Print the parsed page as JSON
    #[arg(long)]
    json: bool,

    /// List the requests that were sent and their status codes
    #[arg(long)]
    requests: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let (req_tx, req_rx) = sync_channel::<(usize, procyclingstats::Request)>(1000);
    let (sta_tx, sta_rx) = sync_channel::<(usize, procyclingstats::StatusCode)>(1000);
    procyclingstats::set_request_callback(req_tx, sta_tx);

    let page = Page::fetch(&cli.url).await;
    if cli.requests {
        print_channel_updates(req_rx, sta_rx);
    }
    let page = page?;
    debug!("{} parsed as {}", page.reference(), page.profile());

    let parsed = page.parse_all()?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&parsed)?);
    } else {
        print_row(&parsed, cli.fulltable);
    }
    Ok(())
}

fn print_row(row: &Row, fulltable: bool) {
    for (key, value) in row.iter() {
        match value {
            Value::Rows(rows) if !rows.is_empty() => {
                println!("{}:", key);
                print_table(rows, fulltable);
            }
            _ => println!("{}: {}", key, value),
        }
    }
}

/// Cell text of every printed line, shortened to head, ellipsis and tail
/// rows unless `fulltable` is set
fn table_lines(rows: &[Row], headers: &[&str], fulltable: bool) -> Vec<Vec<String>> {
    let cells = |row: &Row| -> Vec<String> {
        headers
            .iter()
            .map(|h| row.get(h).map(|v| v.to_string()).unwrap_or_default())
            .collect()
    };

    let mut lines: Vec<Vec<String>> = Vec::new();
    if !fulltable && rows.len() > ABBREVIATE_OVER {
        lines.extend(rows[..HEAD_TAIL_ROWS].iter().map(cells));
        for _ in 0..ELLIPSIS_ROWS {
            lines.push(vec!["...".to_string(); headers.len()]);
        }
        lines.extend(rows[rows.len() - HEAD_TAIL_ROWS..].iter().map(cells));
    } else {
        lines.extend(rows.iter().map(cells));
    }
    lines
}

fn print_table(rows: &[Row], fulltable: bool) {
    let headers: Vec<&str> = rows[0].keys().collect();
    let lines = table_lines(rows, &headers, fulltable);

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for line in &lines {
        for (width, cell) in widths.iter_mut().zip(line) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_line = |line: &[String]| -> String {
        line.iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let header: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    println!("{}", format_line(&header));
    println!("{}", format_line(&widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>()));
    for line in &lines {
        println!("{}", format_line(line));
    }
}

fn print_channel_updates(
    req_rx: Receiver<(usize, procyclingstats::Request)>,
    sta_rx: Receiver<(usize, procyclingstats::StatusCode)>,
) {
    for i in req_rx.try_iter() {
        println!("REQUEST {} --> {}", i.0, i.1.url());
    }

    for i in sta_rx.try_iter() {
        println!("REQUEST {} --> STATUS {}", i.0, i.1);
    }
}

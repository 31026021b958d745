//! `stockroom scan`: the scan screen.
//!
//! ## Scan Loop
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Ctrl+C listener ──► stop flag          installed before the first read │
//! │  DeviceGuard::acquire(stdin scanner)    released on every exit          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  next line ─┬─ stop first ──► session.stop()                            │
//! │             ├─ "reset" ──► session.reset()                              │
//! │             └─ "quit" / EOF ──► stop                                    │
//! │       ▼                                                                 │
//! │  session.observe(code) ── same as last ──► ignored                      │
//! │       │ ticket                                                          │
//! │       ▼                                                                 │
//! │  resolve_barcode ─┬─ stop first ──► session.stop(), result dropped      │
//! │                   ├─ error ──► session.reset(), same code may retry     │
//! │                   ▼                                                     │
//! │  session.accepts(ticket)? ──► Resolution::route                         │
//! │                                 ├── EditExisting ──► show / adjust      │
//! │                                 └── AddNew ───────► prefill hint        │
//! │                                                     + similar items     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lines are read on a dedicated thread so a pending read never blocks the
//! stop flag.

use std::future::Future;
use std::io::{self, BufRead, BufReader, Write};
use std::thread;

use anyhow::Result;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use stockroom_core::barcode::{DeviceGuard, Resolution, ScanDevice, ScanRoute, ScanSession};
use stockroom_core::{ChangeSource, ProductPatch};

use crate::args::ScanArgs;
use crate::client::{ApiClient, ClientError};
use crate::commands::products::print_detail;

/// Lines buffered between the reader thread and the scan loop.
const LINE_BUFFER: usize = 16;

/// A keyboard-wedge scanner: every line on the reader is one decoded code.
///
/// Starting the scanner hands the reader to its own thread. Releasing it
/// closes the channel; the thread exits on its next line.
pub struct LineScanner<R> {
    reader: Option<R>,
    lines: Option<mpsc::Receiver<io::Result<String>>>,
}

impl<R: BufRead + Send + 'static> LineScanner<R> {
    pub fn new(reader: R) -> Self {
        LineScanner {
            reader: Some(reader),
            lines: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.lines.is_some()
    }

    /// Waits for the next line without blocking the runtime.
    pub async fn recv(&mut self) -> io::Result<Option<String>> {
        match self.lines.as_mut() {
            Some(lines) => lines.recv().await.transpose(),
            None => Ok(None),
        }
    }
}

impl<R: BufRead + Send + 'static> ScanDevice for LineScanner<R> {
    type Error = io::Error;

    fn start(&mut self) -> io::Result<()> {
        let reader = self
            .reader
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "scanner already started"))?;
        let (tx, rx) = mpsc::channel(LINE_BUFFER);

        thread::Builder::new()
            .name("scanner".to_string())
            .spawn(move || {
                for line in reader.lines() {
                    let failed = line.is_err();
                    if tx.blocking_send(line).is_err() || failed {
                        break;
                    }
                }
            })?;

        self.lines = Some(rx);
        debug!("Scanner started");
        Ok(())
    }

    fn next_code(&mut self) -> io::Result<Option<String>> {
        match self.lines.as_mut() {
            Some(lines) => lines.blocking_recv().transpose(),
            None => Ok(None),
        }
    }

    fn release(&mut self) {
        if self.lines.take().is_some() {
            debug!("Scanner released");
        }
    }
}

/// What one line of scanner input asks for.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Reset,
    Quit,
    Code(&'a str),
}

fn classify(line: &str) -> Input<'_> {
    match line.trim() {
        "reset" | ":reset" => Input::Reset,
        "quit" | "exit" | ":q" => Input::Quit,
        code => Input::Code(code),
    }
}

/// Why the scan loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanExit {
    Quit,
    Closed,
    Cancelled,
    DeviceFailed,
}

pub async fn run(client: &ApiClient, args: ScanArgs) -> Result<()> {
    let (stop_tx, mut stop) = watch::channel(false);
    let ctrl_c = tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                let _ = stop_tx.send(true);
            }
            Err(e) => warn!(error = %e, "Ctrl+C listener unavailable"),
        }
    });

    let mut scanner = LineScanner::new(BufReader::new(io::stdin()));
    let mut device = DeviceGuard::acquire(&mut scanner)?;
    let mut session = ScanSession::new();

    println!("Scanning. Type 'reset' to scan the same code again, 'quit' to stop.");

    let source = args.source.as_str();
    let adjust = args.adjust;
    let exit = scan_loop(
        &mut device,
        &mut session,
        &mut stop,
        move |code: String| async move { client.resolve_barcode(&code, source).await },
        move |route| handle_route(client, adjust, route),
    )
    .await;

    ctrl_c.abort();
    drop(device);
    match exit {
        ScanExit::Cancelled => println!("\nScan cancelled"),
        _ => println!("Scanner stopped"),
    }
    Ok(())
}

/// Resolves once the stop flag is raised. Never resolves if the listener
/// went away without raising it.
async fn cancelled(stop: &mut watch::Receiver<bool>) {
    if stop.wait_for(|stopped| *stopped).await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Reads codes until quit, end of input, a device failure or the stop flag.
/// The session is stopped on every exit.
async fn scan_loop<R, L, LF, H, HF>(
    device: &mut DeviceGuard<'_, LineScanner<R>>,
    session: &mut ScanSession,
    stop: &mut watch::Receiver<bool>,
    mut lookup: L,
    mut handle: H,
) -> ScanExit
where
    R: BufRead + Send + 'static,
    L: FnMut(String) -> LF,
    LF: Future<Output = Result<Resolution, ClientError>>,
    H: FnMut(ScanRoute) -> HF,
    HF: Future<Output = ()>,
{
    let exit = loop {
        prompt();
        let read = tokio::select! {
            biased;
            _ = cancelled(stop) => None,
            read = device.device_mut().recv() => Some(read),
        };
        let line = match read {
            None => break ScanExit::Cancelled,
            Some(Ok(Some(line))) => line,
            Some(Ok(None)) => break ScanExit::Closed,
            Some(Err(e)) => {
                warn!(error = %e, "Scanner read failed");
                eprintln!("Scanner unavailable: {}. Check the device and run scan again.", e);
                break ScanExit::DeviceFailed;
            }
        };

        let code = match classify(&line) {
            Input::Reset => {
                session.reset();
                println!("Ready for the next scan");
                continue;
            }
            Input::Quit => break ScanExit::Quit,
            Input::Code(code) => code,
        };

        let Some(ticket) = session.observe(code) else {
            debug!(code, "Repeat scan ignored");
            continue;
        };

        let result = tokio::select! {
            biased;
            _ = cancelled(stop) => None,
            result = lookup(ticket.code().to_string()) => Some(result),
        };
        let Some(result) = result else {
            break ScanExit::Cancelled;
        };
        if !session.accepts(&ticket) {
            debug!(code = ticket.code(), "Stale lookup discarded");
            continue;
        }

        match result {
            Ok(resolution) => handle(resolution.route(ticket.code())).await,
            Err(err) => {
                match err {
                    ClientError::Unreachable { .. } => eprintln!("{}", err),
                    _ => eprintln!("Lookup failed: {}", err),
                }
                // Let the same code be retried.
                session.reset();
            }
        }
    };

    session.stop();
    exit
}

async fn handle_route(client: &ApiClient, adjust: Option<i64>, route: ScanRoute) {
    match route {
        ScanRoute::EditExisting(product) => match adjust {
            Some(delta) => {
                let patch = ProductPatch {
                    quantity: Some(adjusted_quantity(product.quantity, delta)),
                    ..ProductPatch::default()
                };
                match client
                    .update_product(product.id, &patch, ChangeSource::Scanned)
                    .await
                {
                    Ok(updated) => println!(
                        "{} ({}): quantity {} -> {}",
                        updated.name, updated.sku, product.quantity, updated.quantity
                    ),
                    Err(err) => eprintln!("Update failed: {}", err),
                }
            }
            None => {
                print_detail(&product);
                println!(
                    "  Edit: stockroom products edit {} --source scanned",
                    product.id
                );
            }
        },
        ScanRoute::AddNew {
            barcode,
            suggestions,
        } => {
            println!("No product with barcode {}", barcode);
            println!(
                "  Add:  stockroom products add --barcode {} --source scanned --name ... --sku ... --quantity ...",
                barcode
            );
            if !suggestions.is_empty() {
                println!("  Similar products you may want to edit instead:");
                for p in &suggestions {
                    println!(
                        "    #{:<5} {:<28} {:<16} {}",
                        p.id,
                        p.name,
                        p.sku,
                        p.barcode.as_deref().unwrap_or("-")
                    );
                }
            }
        }
    }
}

/// Quantity after an `--adjust`, floored at zero.
fn adjusted_quantity(current: i64, delta: i64) -> i64 {
    current.saturating_add(delta).max(0)
}

fn prompt() {
    print!("scan> ");
    // A failed flush only loses the prompt.
    let _ = io::stdout().flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};
    use std::sync::mpsc as std_mpsc;
    use tokio::sync::oneshot;

    /// A reader with nothing to say until its sender is dropped.
    struct Idle(std_mpsc::Receiver<()>);

    impl Read for Idle {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            let _ = self.0.recv();
            Ok(0)
        }
    }

    /// Runs the loop over `input` with lookups that answer "nothing found".
    async fn scan_lines(input: &'static str) -> (ScanExit, Vec<String>, Vec<ScanRoute>, bool) {
        let mut scanner = LineScanner::new(Cursor::new(input));
        let mut session = ScanSession::new();
        let (_stop_tx, mut stop) = watch::channel(false);
        let mut lookups = Vec::new();
        let mut routes = Vec::new();

        let exit = {
            let mut device = DeviceGuard::acquire(&mut scanner).unwrap();
            scan_loop(
                &mut device,
                &mut session,
                &mut stop,
                |code: String| {
                    lookups.push(code);
                    async { Ok::<_, ClientError>(Resolution::default()) }
                },
                |route| {
                    routes.push(route);
                    async {}
                },
            )
            .await
        };

        assert!(!session.is_running());
        (exit, lookups, routes, scanner.is_open())
    }

    #[test]
    fn test_classify_input() {
        assert_eq!(classify(" reset "), Input::Reset);
        assert_eq!(classify("quit"), Input::Quit);
        assert_eq!(classify(" 000111\r"), Input::Code("000111"));
    }

    #[test]
    fn test_guard_releases_scanner() {
        let mut scanner = LineScanner::new(Cursor::new("000111\n000111\n"));
        {
            let mut guard = DeviceGuard::acquire(&mut scanner).unwrap();
            assert_eq!(guard.next_code().unwrap().as_deref(), Some("000111"));
        }
        assert!(!scanner.is_open());
        assert_eq!(scanner.next_code().unwrap(), None);
    }

    #[tokio::test]
    async fn test_repeated_code_triggers_one_lookup() {
        let (exit, lookups, routes, open) =
            scan_lines("000111\n000111\nreset\n000111\n").await;

        assert_eq!(exit, ScanExit::Closed);
        assert_eq!(lookups, vec!["000111", "000111"]);
        assert_eq!(routes.len(), 2);
        assert!(matches!(&routes[0], ScanRoute::AddNew { barcode, .. } if barcode == "000111"));
        assert!(!open);
    }

    #[tokio::test]
    async fn test_quit_ends_loop() {
        let (exit, lookups, _, open) = scan_lines("000111\nquit\n000222\n").await;
        assert_eq!(exit, ScanExit::Quit);
        assert_eq!(lookups, vec!["000111"]);
        assert!(!open);
    }

    #[tokio::test]
    async fn test_cancel_at_prompt_stops_and_releases() {
        let (hold, idle) = std_mpsc::channel::<()>();
        let mut scanner = LineScanner::new(BufReader::new(Idle(idle)));
        let mut session = ScanSession::new();
        let (stop_tx, mut stop) = watch::channel(false);
        let mut lookups = Vec::new();

        let exit = {
            let mut device = DeviceGuard::acquire(&mut scanner).unwrap();
            let (exit, ()) = tokio::join!(
                scan_loop(
                    &mut device,
                    &mut session,
                    &mut stop,
                    |code: String| {
                        lookups.push(code);
                        async { Ok::<_, ClientError>(Resolution::default()) }
                    },
                    |_route| async {},
                ),
                async {
                    stop_tx.send(true).unwrap();
                }
            );
            exit
        };

        assert_eq!(exit, ScanExit::Cancelled);
        assert!(!session.is_running());
        assert!(lookups.is_empty());
        assert!(!scanner.is_open());
        drop(hold);
    }

    #[tokio::test]
    async fn test_cancel_during_lookup_drops_result() {
        let mut scanner = LineScanner::new(Cursor::new("000111\n000222\n"));
        let mut session = ScanSession::new();
        let (stop_tx, mut stop) = watch::channel(false);
        let (started_tx, started_rx) = oneshot::channel::<()>();
        let mut started_tx = Some(started_tx);
        let mut lookups = Vec::new();
        let mut routes = Vec::new();

        let exit = {
            let mut device = DeviceGuard::acquire(&mut scanner).unwrap();
            let (exit, ()) = tokio::join!(
                scan_loop(
                    &mut device,
                    &mut session,
                    &mut stop,
                    |code: String| {
                        lookups.push(code);
                        let started = started_tx.take();
                        async move {
                            if let Some(started) = started {
                                let _ = started.send(());
                            }
                            std::future::pending::<Result<Resolution, ClientError>>().await
                        }
                    },
                    |route| {
                        routes.push(route);
                        async {}
                    },
                ),
                async {
                    started_rx.await.unwrap();
                    stop_tx.send(true).unwrap();
                }
            );
            exit
        };

        assert_eq!(exit, ScanExit::Cancelled);
        assert_eq!(lookups, vec!["000111"]);
        assert!(routes.is_empty());
        assert!(!session.is_running());
        assert!(!scanner.is_open());
    }

    #[tokio::test]
    async fn test_failed_lookup_allows_same_code_again() {
        let mut scanner = LineScanner::new(Cursor::new("000111\n000111\n"));
        let mut session = ScanSession::new();
        let (_stop_tx, mut stop) = watch::channel(false);
        let mut calls = 0;
        let mut routes = Vec::new();

        let exit = {
            let mut device = DeviceGuard::acquire(&mut scanner).unwrap();
            scan_loop(
                &mut device,
                &mut session,
                &mut stop,
                |_code: String| {
                    calls += 1;
                    let fail = calls == 1;
                    async move {
                        if fail {
                            Err(ClientError::Rejected {
                                status: 503,
                                message: "store offline".to_string(),
                            })
                        } else {
                            Ok(Resolution::default())
                        }
                    }
                },
                |route| {
                    routes.push(route);
                    async {}
                },
            )
            .await
        };

        assert_eq!(exit, ScanExit::Closed);
        assert_eq!(calls, 2);
        assert_eq!(routes.len(), 1);
    }

    #[test]
    fn test_adjusted_quantity_saturates_and_floors() {
        assert_eq!(adjusted_quantity(5, 3), 8);
        assert_eq!(adjusted_quantity(5, -9), 0);
        assert_eq!(adjusted_quantity(i64::MAX, 1), i64::MAX);
        assert_eq!(adjusted_quantity(3, i64::MIN), 0);
    }
}

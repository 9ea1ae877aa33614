//! Plain-text rendering for the command loop.

use std::{
    error::Error,
    fmt::Display,
    io::{self, Write},
};

use crossterm::style::Stylize;
use tycoon_core::{
    transfer::TransferReceipt, CollectReport, StatusReport, TransferEvent, UpgradeReceipt,
};

pub fn prompt(text: &str) -> io::Result<()> {
    let mut stdout = io::stdout();
    write!(stdout, "{}", text.bold())?;
    stdout.flush()
}

pub fn info(message: impl Display) {
    println!("{message}");
}

pub fn success(message: impl Display) {
    println!("{}", message.to_string().green());
}

pub fn warning(message: impl Display) {
    println!("{}", message.to_string().yellow());
}

/// Print an error together with its source chain.
pub fn failure(err: &dyn Error) {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(&format!(": {cause}"));
        source = cause.source();
    }
    println!("{}", message.red());
}

pub fn status(report: &StatusReport) {
    println!("{}", format_status(report));
}

pub fn collected(report: &CollectReport) {
    println!("{}", format_collect(report));
}

pub fn upgraded(receipt: &UpgradeReceipt) {
    success(format!(
        "Upgraded {} to level {} for ${:.2}. Remaining balance: ${:.2}",
        receipt.name, receipt.level, receipt.cost, receipt.balance
    ));
}

pub fn sent(receipt: &TransferReceipt) {
    success(format!(
        "Successfully sent ${} to {}. Remaining balance: ${:.2}",
        receipt.amount, receipt.peer, receipt.balance
    ));
}

pub fn transfer_event(event: &TransferEvent) {
    match event {
        TransferEvent::Received { .. } => success(format!("\n{}", format_event(event))),
        TransferEvent::Rejected { .. } => warning(format!("\n{}", format_event(event))),
    }
}

fn format_status(report: &StatusReport) -> String {
    let mut lines = vec![format!("\n=== {}'s Business Status ===", report.username)];
    for (position, business) in report.businesses.iter().enumerate() {
        lines.push(format!(
            "{}. {} - Level: {}, Income: ${:.2} per {:.2} sec",
            position + 1,
            business.name,
            business.level,
            business.base_income,
            business.income_interval
        ));
    }
    lines.push(format!("\nBalance: ${:.2}\n", report.balance));
    lines.join("\n")
}

fn format_collect(report: &CollectReport) -> String {
    let mut lines = vec!["\nCollecting income from all businesses...".to_string()];
    for payout in &report.payouts {
        lines.push(format!("Collected ${:.2} from {}.", payout.amount, payout.name));
    }
    lines.push(format!("Total income collected: ${:.2}", report.total));
    lines.join("\n")
}

fn format_event(event: &TransferEvent) -> String {
    match event {
        TransferEvent::Received {
            sender,
            amount,
            balance,
            ..
        } => format!("Received ${amount:.2} from {sender}. New balance: ${balance:.2}"),
        TransferEvent::Rejected { peer, reason } => {
            format!("Ignored transfer from {peer}: {reason}")
        }
    }
}

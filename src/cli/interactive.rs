//! Interactive conversion form.
//!
//! Reads one command per line while the startup refresh runs in the background. The
//! refresh outcome is printed as soon as it is observed.

use super::{rates, ui};
use crate::core::{Converter, ConverterForm, Currency, RefreshHandle, RefreshStatus, Severity};
use anyhow::{Context, Result};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum FormCommand {
    Convert {
        amount: String,
        from: String,
        to: String,
    },
    SetAmount(String),
    SetFrom(String),
    SetTo(String),
    Submit,
    Clear,
    Refresh,
    Rates,
    Help,
    Quit,
    Unknown(String),
}

/// Parses one input line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Option<FormCommand> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let command = match words.as_slice() {
        [] => return None,
        ["quit" | "exit" | "q"] => FormCommand::Quit,
        ["help" | "?"] => FormCommand::Help,
        ["clear"] => FormCommand::Clear,
        ["refresh"] => FormCommand::Refresh,
        ["rates"] => FormCommand::Rates,
        ["convert"] => FormCommand::Submit,
        ["amount", amount] => FormCommand::SetAmount(amount.to_string()),
        ["from", code] => FormCommand::SetFrom(code.to_string()),
        ["to", code] => FormCommand::SetTo(code.to_string()),
        [amount, from, to] => FormCommand::Convert {
            amount: amount.to_string(),
            from: from.to_string(),
            to: to.to_string(),
        },
        _ => FormCommand::Unknown(line.trim().to_string()),
    };
    Some(command)
}

fn print_help() {
    println!("{}", ui::style_text("Currency converter", ui::StyleType::Title));
    println!("  <amount> <from> <to>   convert, e.g. `100 USD EUR`");
    println!("  amount <value>         set the amount");
    println!("  from <code>            select the source currency");
    println!("  to <code>              select the target currency");
    println!("  convert                convert the current selection");
    println!("  clear                  reset the form");
    println!("  refresh                fetch the latest rates again");
    println!("  rates                  show stored rates");
    println!("  quit                   leave");
    let codes: Vec<&str> = Currency::ALL.iter().map(|c| c.as_str()).collect();
    println!(
        "{}",
        ui::style_text(&format!("Currencies: {}", codes.join(", ")), ui::StyleType::Subtle)
    );
}

fn select_currency(code: &str) -> Option<Currency> {
    match code.parse::<Currency>() {
        Ok(currency) => Some(currency),
        Err(e) => {
            println!("{}", ui::prompt_message(&e.to_string(), Severity::Info));
            None
        }
    }
}

fn submit(form: &mut ConverterForm, converter: &Converter) {
    match form.submit(converter) {
        Ok(result) => println!("{}", ui::style_text(result, ui::StyleType::Result)),
        Err(e) => println!("{}", ui::prompt_message(&e.to_string(), e.severity())),
    }
}

async fn completion(handle: &mut Option<RefreshHandle>) -> RefreshStatus {
    match handle {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

/// Runs the form on stdin.
pub async fn run(converter: &Converter) -> Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    run_with(converter, stdin).await.map(|_| ())
}

/// Runs the form on `input` and returns its final state.
pub async fn run_with<R>(converter: &Converter, input: R) -> Result<ConverterForm>
where
    R: AsyncBufRead + Unpin,
{
    print_help();
    let mut form = ConverterForm::default();
    let mut refresh = Some(converter.refresh_rates());
    let mut lines = input.lines();

    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        tokio::select! {
            status = completion(&mut refresh) => {
                refresh = None;
                println!();
                println!("{}", ui::refresh_message(&status));
            }
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read input")? else {
                    debug!("Input closed");
                    break;
                };
                let Some(command) = parse_command(&line) else {
                    continue;
                };
                debug!(?command, "Form command");

                match command {
                    FormCommand::Quit => break,
                    FormCommand::Help => print_help(),
                    FormCommand::Clear => form.clear_inputs(),
                    FormCommand::SetAmount(amount) => form.amount = amount,
                    FormCommand::SetFrom(code) => {
                        if let Some(currency) = select_currency(&code) {
                            form.from = Some(currency);
                        }
                    }
                    FormCommand::SetTo(code) => {
                        if let Some(currency) = select_currency(&code) {
                            form.to = Some(currency);
                        }
                    }
                    FormCommand::Submit => submit(&mut form, converter),
                    FormCommand::Convert { amount, from, to } => {
                        if let (Some(from), Some(to)) = (select_currency(&from), select_currency(&to)) {
                            form.amount = amount;
                            form.from = Some(from);
                            form.to = Some(to);
                            submit(&mut form, converter);
                        }
                    }
                    FormCommand::Refresh => {
                        if refresh.is_some() {
                            println!("{}", ui::style_text("A refresh is already running", ui::StyleType::Subtle));
                        } else {
                            refresh = Some(converter.refresh_rates());
                        }
                    }
                    FormCommand::Rates => {
                        if let Err(e) = rates::show_rates(converter) {
                            println!("{}", ui::prompt_message(&format!("{e:#}"), Severity::Error));
                        }
                    }
                    FormCommand::Unknown(input) => println!(
                        "{}",
                        ui::prompt_message(&format!("Unknown command: {input}, type `help`"), Severity::Info)
                    ),
                }
            }
        }
    }

    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rates::fixtures::sample_snapshot;
    use crate::core::{RateProvider, RateSnapshot};
    use crate::store::{MemoryRateStore, RateStore};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct FixedProvider(RateSnapshot);

    #[async_trait]
    impl RateProvider for FixedProvider {
        async fn fetch_latest(&self) -> RateSnapshot {
            self.0.clone()
        }
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("   "), None);
        assert_eq!(parse_command("quit"), Some(FormCommand::Quit));
        assert_eq!(
            parse_command("100 usd EUR"),
            Some(FormCommand::Convert {
                amount: "100".to_string(),
                from: "usd".to_string(),
                to: "EUR".to_string(),
            })
        );
        assert_eq!(
            parse_command("amount -2.5"),
            Some(FormCommand::SetAmount("-2.5".to_string()))
        );
        assert_eq!(
            parse_command("from PLN"),
            Some(FormCommand::SetFrom("PLN".to_string()))
        );
        assert_eq!(parse_command("convert"), Some(FormCommand::Submit));
        assert_eq!(
            parse_command("what is this"),
            Some(FormCommand::Convert {
                amount: "what".to_string(),
                from: "is".to_string(),
                to: "this".to_string(),
            })
        );
        assert_eq!(
            parse_command("one two"),
            Some(FormCommand::Unknown("one two".to_string()))
        );
    }

    #[tokio::test]
    async fn test_form_session() {
        let store = Arc::new(MemoryRateStore::new());
        let converter = Converter::new(
            store.clone(),
            Arc::new(FixedProvider(sample_snapshot())),
            Currency::USD,
        );

        let input: &[u8] = b"amount 10\nfrom usd\nto GBP\nconvert\n";
        let form = run_with(&converter, input).await.unwrap();

        assert_eq!(form.amount, "10");
        assert_eq!(form.from, Some(Currency::USD));
        assert_eq!(form.to, Some(Currency::GBP));
        // USD to USD works with or without fetched rates
        let input: &[u8] = b"3 USD USD\nclear\nquit\n";
        let form = run_with(&converter, input).await.unwrap();
        assert_eq!(form, ConverterForm::default());

        converter.refresh_rates().wait().await;
        assert_eq!(store.count().unwrap(), 12);
    }

    #[tokio::test]
    async fn test_unknown_currency_keeps_form() {
        let converter = Converter::new(
            Arc::new(MemoryRateStore::new()),
            Arc::new(FixedProvider(RateSnapshot::empty())),
            Currency::USD,
        );

        let input: &[u8] = b"5 USD BTC\n";
        let form = run_with(&converter, input).await.unwrap();
        assert_eq!(form, ConverterForm::default());
    }
}

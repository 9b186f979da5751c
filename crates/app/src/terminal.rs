//! Line-oriented terminal front end.

use core::str::FromStr;
use std::io::{BufRead, Write};

use anyhow::Context;
use chrono::NaiveDate;
use thiserror::Error;

use shelf_infra::StoreError;
use shelf_products::ProductDraft;

use crate::presenter::{PresenterError, ProductListPresenter};
use crate::view::{ProductListView, ProductRow};

pub const HELP: &str = "\
commands:
  list                          show all products
  add <name> <price> <rating>   add a product (name may contain spaces)
  delete <row>                  delete the product shown at <row>
  json                          print all products as JSON
  help                          show this message
  quit                          leave";

const ADD_USAGE: &str = "usage: add <name> <price> <rating>";
const DELETE_USAGE: &str = "usage: delete <row>";

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Add(ProductDraft),
    Delete(usize),
    Json,
    Help,
    Quit,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),

    #[error("{0}")]
    Usage(&'static str),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Err(CommandError::Empty);
        };
        let args: Vec<&str> = words.collect();

        match verb.to_ascii_lowercase().as_str() {
            "list" | "ls" => Ok(Command::List),
            "add" => match args.as_slice() {
                [name @ .., price, rating] if !name.is_empty() => Ok(Command::Add(
                    ProductDraft::new(name.join(" "), *price, *rating),
                )),
                _ => Err(CommandError::Usage(ADD_USAGE)),
            },
            "delete" | "rm" => match args.as_slice() {
                [row] => row
                    .parse()
                    .map(Command::Delete)
                    .map_err(|_| CommandError::Usage(DELETE_USAGE)),
                _ => Err(CommandError::Usage(DELETE_USAGE)),
            },
            "json" => Ok(Command::Json),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

/// Writes the product list and alerts as plain text.
#[derive(Debug)]
pub struct TerminalView<W> {
    out: W,
}

impl<W> TerminalView<W>
where
    W: Write,
{
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn print(&mut self, text: &str) {
        if let Err(err) = writeln!(self.out, "{text}").and_then(|_| self.out.flush()) {
            tracing::warn!(error = %err, "failed to write to terminal");
        }
    }
}

impl<W> ProductListView for TerminalView<W>
where
    W: Write,
{
    fn render(&mut self, rows: &[ProductRow]) {
        let mut text = format!("Products ({})", rows.len());
        for (index, row) in rows.iter().enumerate() {
            text.push_str(&format!("\n{index:>3}. {}\n     {}", row.title, row.detail));
        }
        self.print(&text);
    }

    fn show_alert(&mut self, title: &str) {
        self.print(&format!("! {title}"));
    }
}

/// Read commands from `input` until EOF or `quit`.
///
/// Rejected requests are reported and the session continues; a failing store ends the
/// session with an error.
pub fn run<R, W>(
    presenter: &mut ProductListPresenter<TerminalView<W>>,
    input: R,
    today: impl Fn() -> NaiveDate,
) -> anyhow::Result<()>
where
    R: BufRead,
    W: Write,
{
    for line in input.lines() {
        let line = line.context("failed to read command")?;
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(err) => {
                presenter.view_mut().print(&err.to_string());
                continue;
            }
        };

        match command {
            Command::Quit => break,
            Command::Help => presenter.view_mut().print(HELP),
            Command::List => presenter.refresh()?,
            Command::Json => {
                let products = presenter.store().list_all()?;
                let json = serde_json::to_string_pretty(&products)
                    .context("failed to serialize products")?;
                presenter.view_mut().print(&json);
            }
            Command::Add(draft) => match presenter.add_product(&draft, today()) {
                Ok(()) => {}
                Err(PresenterError::Store(err)) if !err.is_fatal() => {
                    presenter.view_mut().print(&err.to_string());
                }
                // Invalid input and duplicate names were already shown as alerts.
                Err(err) if !err.is_fatal() => {}
                Err(err) => return Err(err).context("add failed"),
            },
            Command::Delete(row) => match presenter.delete_row(row) {
                Ok(_) => {}
                Err(PresenterError::Store(StoreError::IndexOutOfRange { index, len })) => {
                    presenter
                        .view_mut()
                        .print(&format!("no row {index} (list has {len} rows)"));
                }
                Err(PresenterError::Store(err)) if !err.is_fatal() => {
                    presenter.view_mut().print(&err.to_string());
                }
                Err(err) => return Err(err).context("delete failed"),
            },
        }

        presenter.pump()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelf_infra::{InMemoryProductRepository, InsertMode, ProductRepository, ProductStore};
    use shelf_products::{Price, Product, parse_start_date, seed_products};

    fn today() -> NaiveDate {
        parse_start_date("2024-06-01").unwrap()
    }

    fn session(script: &str) -> String {
        let mut presenter =
            ProductListPresenter::new(ProductStore::in_memory(), TerminalView::new(Vec::new()));
        presenter.start(seed_products(today()).unwrap()).unwrap();

        run(&mut presenter, script.as_bytes(), today).unwrap();

        String::from_utf8(presenter.close().into_inner()).unwrap()
    }

    /// Repository holding one product whose writes all fail with `error`.
    #[derive(Debug)]
    struct BrokenWrites {
        inner: InMemoryProductRepository,
        error: StoreError,
    }

    impl BrokenWrites {
        fn new(error: StoreError) -> Self {
            let inner = InMemoryProductRepository::new();
            let katana = Product::new("Katana", Price::from_cents(8050), 2, today()).unwrap();
            inner.insert(vec![katana], InsertMode::Always).unwrap();
            Self { inner, error }
        }
    }

    impl ProductRepository for BrokenWrites {
        fn list(&self) -> Result<Vec<Product>, StoreError> {
            self.inner.list()
        }

        fn find_by_name(&self, name: &str) -> Result<Vec<Product>, StoreError> {
            self.inner.find_by_name(name)
        }

        fn count(&self) -> Result<usize, StoreError> {
            self.inner.count()
        }

        fn insert(&self, _products: Vec<Product>, _mode: InsertMode) -> Result<usize, StoreError> {
            Err(self.error.clone())
        }

        fn delete_at(&self, _index: usize) -> Result<Product, StoreError> {
            Err(self.error.clone())
        }

        fn location(&self) -> String {
            "broken".to_string()
        }
    }

    fn broken_session(error: StoreError, script: &str) -> (anyhow::Result<()>, String) {
        let store = ProductStore::new(BrokenWrites::new(error));
        let mut presenter = ProductListPresenter::new(store, TerminalView::new(Vec::new()));
        presenter.start(Vec::new()).unwrap();

        let result = run(&mut presenter, script.as_bytes(), today);

        (result, String::from_utf8(presenter.close().into_inner()).unwrap())
    }

    #[test]
    fn parses_add_with_multi_word_name() {
        let command: Command = "add Bo Staff 12.5 3".parse().unwrap();
        assert_eq!(command, Command::Add(ProductDraft::new("Bo Staff", "12.5", "3")));
    }

    #[test]
    fn add_without_name_is_a_usage_error() {
        assert_eq!(
            "add 12.5 3".parse::<Command>(),
            Err(CommandError::Usage(ADD_USAGE))
        );
    }

    #[test]
    fn parses_delete_and_aliases() {
        assert_eq!("delete 2".parse::<Command>(), Ok(Command::Delete(2)));
        assert_eq!("RM 0".parse::<Command>(), Ok(Command::Delete(0)));
        assert_eq!(
            "delete first".parse::<Command>(),
            Err(CommandError::Usage(DELETE_USAGE))
        );
        assert_eq!("q".parse::<Command>(), Ok(Command::Quit));
    }

    #[test]
    fn unknown_and_empty_lines_are_errors() {
        assert_eq!("   ".parse::<Command>(), Err(CommandError::Empty));
        assert_eq!(
            "edit 1".parse::<Command>(),
            Err(CommandError::Unknown("edit".to_string()))
        );
    }

    #[test]
    fn session_renders_after_each_mutation() {
        let output = session("add Kama 19.99 4\ndelete 0\nquit\nadd Never 1 1\n");

        assert_eq!(output.matches("Products (").count(), 3);
        assert!(output.contains("Products (5)"));
        assert!(output.contains("  4. Kama\n     $19.99, 4 stars, sold since 2024-06-01"));
        assert!(output.trim_end().ends_with("  3. Kama\n     $19.99, 4 stars, sold since 2024-06-01"));
        assert!(!output.contains("Never"));
    }

    #[test]
    fn session_reports_rejections_and_continues() {
        let output = session("add Katana 1 1\ndelete 9\nfly\nlist\n");

        assert!(output.contains("! There's already a product named Katana in the database"));
        assert!(output.contains("no row 9 (list has 4 rows)"));
        assert!(output.contains("unknown command 'fly'"));
        assert_eq!(output.matches("Products (4)").count(), 2);
    }

    #[test]
    fn storage_failure_on_add_ends_the_session() {
        let (result, output) = broken_session(
            StoreError::storage("insert_product", "disk full"),
            "add Kama 19.99 4\nlist\n",
        );

        let err = result.unwrap_err();
        assert!(format!("{err:#}").starts_with("add failed"));
        assert!(format!("{err:#}").contains("disk full"));
        assert_eq!(output.matches("Products (").count(), 1);
    }

    #[test]
    fn storage_failure_on_delete_ends_the_session() {
        let (result, output) = broken_session(
            StoreError::storage("delete_product", "disk full"),
            "delete 0\nlist\n",
        );

        assert!(format!("{:#}", result.unwrap_err()).starts_with("delete failed"));
        assert_eq!(output.matches("Products (").count(), 1);
    }

    #[test]
    fn non_fatal_store_errors_are_reported_and_the_session_continues() {
        let (result, output) = broken_session(
            StoreError::Notify("change bus lock poisoned".to_string()),
            "add Kama 19.99 4\ndelete 0\nlist\n",
        );

        result.unwrap();
        assert_eq!(
            output.matches("change notification failed: change bus lock poisoned").count(),
            2
        );
        assert_eq!(output.matches("Products (1)").count(), 2);
    }

    #[test]
    fn json_lists_products_with_decimal_prices() {
        let output = session("json\n");

        assert!(output.contains("\"name\": \"Katana\""));
        assert!(output.contains("\"price\": \"80.50\""));
        assert!(output.contains("\"start_date\": \"2013-02-28\""));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 200,
                ..ProptestConfig::default()
            })]

            /// Property: the last two words are always price and rating; the rest is the name.
            #[test]
            fn add_splits_name_from_trailing_fields(
                words in proptest::collection::vec("[A-Za-z]{1,8}", 1..4),
                price in "[0-9]{1,4}\\.[0-9]{2}",
                rating in 0i32..6,
            ) {
                let line = format!("add {} {price} {rating}", words.join(" "));
                let command: Command = line.parse().unwrap();
                prop_assert_eq!(
                    command,
                    Command::Add(ProductDraft::new(words.join(" "), price, rating.to_string()))
                );
            }
        }
    }
}

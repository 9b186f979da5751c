use anyhow::Context;
use chrono::{Local, NaiveDate};

use shelf_app::{ProductListPresenter, TerminalView, terminal};
use shelf_infra::{ProductStore, StoreConfig};
use shelf_products::seed_products;

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// sqlx logs every statement at `info`.
const LOG_FILTER: &str = "info,sqlx=warn";

fn main() -> anyhow::Result<()> {
    shelf_observability::init_with_default(LOG_FILTER);

    let config = StoreConfig::from_env().context("invalid configuration")?;
    let store = ProductStore::open(&config).context("failed to open product store")?;
    tracing::info!(path = %store.location(), "product database location");

    let seed = if config.seed_on_start {
        seed_products(today()).context("invalid demo products")?
    } else {
        Vec::new()
    };

    let mut presenter = ProductListPresenter::new(store, TerminalView::new(std::io::stdout()));
    presenter.start(seed).context("failed to load products")?;
    presenter.view_mut().print("type 'help' for commands");

    let result = terminal::run(&mut presenter, std::io::stdin().lock(), today);
    presenter.close();

    if let Err(err) = &result {
        tracing::error!(error = %format!("{err:#}"), "session ended with a store failure");
    }
    result
}

//! Terminal storefront session.
//!
//! [`Storefront`] is the presentation layer: it owns the basket, the open
//! checkout (if any), the search state and the catalog provider, and turns
//! [`ShellCommand`]s into calls on them. Output goes to any [`Write`], so
//! the same code serves the interactive shell, scripts and tests.

use std::io::{BufRead, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use bookshop_core::checkout::{AddressInput, CheckoutError, CheckoutFlow, PaymentInput};
use bookshop_core::{
    BookId, BookRecord, CartStore, CartUpdate, CatalogProvider, CheckoutReceipt, CheckoutStep,
    CurrencyCode, SearchState,
};
use tracing::debug;

use crate::error::Result;
use crate::shell::{ParseError, ShellCommand, parse_line};

/// Whether the shell should keep reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// One shopper's session.
pub struct Storefront<P> {
    catalog: P,
    cart: CartStore,
    checkout: Option<CheckoutFlow>,
    search: SearchState,
    currency: CurrencyCode,
    badge: Arc<AtomicU32>,
}

impl<P: CatalogProvider> Storefront<P> {
    /// Create a session with an empty basket.
    pub fn new(catalog: P, search: SearchState, currency: CurrencyCode) -> Self {
        let mut cart = CartStore::new(currency);
        let badge = Arc::new(AtomicU32::new(0));

        // Keeps the prompt's basket counter in step with the cart.
        let counter = Arc::clone(&badge);
        cart.subscribe(move |change, items| {
            let count = items
                .iter()
                .fold(0u32, |acc, line| acc.saturating_add(line.quantity.get()));
            counter.store(count, Ordering::Relaxed);
            debug!(?change, count, "Basket badge updated");
        });

        Self {
            catalog,
            cart,
            checkout: None,
            search,
            currency,
            badge,
        }
    }

    #[must_use]
    pub const fn cart(&self) -> &CartStore {
        &self.cart
    }

    #[must_use]
    pub const fn checkout(&self) -> Option<&CheckoutFlow> {
        self.checkout.as_ref()
    }

    #[must_use]
    pub const fn search(&self) -> &SearchState {
        &self.search
    }

    /// Item count shown next to the prompt.
    #[must_use]
    pub fn badge(&self) -> u32 {
        self.badge.load(Ordering::Relaxed)
    }

    /// Read commands from `input` until EOF or `quit`.
    ///
    /// With `prompt` set, a prompt is written before each line.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure or if the catalog cannot be queried.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W, prompt: bool) -> Result<()> {
        if prompt {
            self.write_prompt(out)?;
        }
        for line in input.lines() {
            let line = line?;
            match parse_line(&line) {
                Ok(Some(command)) => {
                    if self.execute(command, out)? == Flow::Quit {
                        return Ok(());
                    }
                }
                Ok(None) => {}
                Err(ParseError::Clap(err)) => write!(out, "{}", err.render())?,
                Err(err) => writeln!(out, "{err}")?,
            }
            if prompt {
                self.write_prompt(out)?;
            }
        }
        Ok(())
    }

    fn write_prompt<W: Write>(&self, out: &mut W) -> Result<()> {
        write!(out, "bookshop [{}]> ", self.badge())?;
        out.flush()?;
        Ok(())
    }

    /// Apply one command.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure or if the catalog cannot be queried.
    pub fn execute<W: Write>(&mut self, command: ShellCommand, out: &mut W) -> Result<Flow> {
        match command {
            ShellCommand::Add { .. }
            | ShellCommand::Inc { .. }
            | ShellCommand::Dec { .. }
            | ShellCommand::Remove { .. }
            | ShellCommand::Clear
                if self.checkout.is_some() =>
            {
                writeln!(
                    out,
                    "Checkout in progress. Finish or `cancel` it before changing the basket."
                )?;
            }
            ShellCommand::Search { terms } => {
                self.search.set_query(&terms.join(" "));
                self.print_results(out)?;
            }
            ShellCommand::Next => {
                self.search.next_page();
                self.print_results(out)?;
            }
            ShellCommand::Prev => {
                if self.search.previous_page() {
                    self.print_results(out)?;
                } else {
                    writeln!(out, "Already on the first page.")?;
                }
            }
            ShellCommand::Show { id } => self.show(&BookId::from(id), out)?,
            ShellCommand::Add { id } => self.add(&BookId::from(id), out)?,
            ShellCommand::Inc { id } => {
                let id = BookId::from(id);
                let update = self.cart.increment_quantity(&id);
                self.report_quantity(&id, update, out)?;
            }
            ShellCommand::Dec { id } => {
                let id = BookId::from(id);
                let update = self.cart.decrement_quantity(&id);
                self.report_quantity(&id, update, out)?;
            }
            ShellCommand::Remove { id } => {
                let id = BookId::from(id);
                match self.cart.remove_item(&id) {
                    CartUpdate::Applied => writeln!(out, "Removed {id} from the basket.")?,
                    CartUpdate::NotFound => writeln!(out, "{id} is not in the basket.")?,
                }
            }
            ShellCommand::Clear => {
                self.cart.clear_basket();
                writeln!(out, "Basket cleared.")?;
            }
            ShellCommand::Cart => self.print_cart(out)?,
            ShellCommand::Checkout => self.start_checkout(out)?,
            ShellCommand::Address {
                first_name,
                last_name,
                address,
            } => {
                let input = AddressInput {
                    first_name,
                    last_name,
                    address,
                };
                self.submit_address(&input, out)?;
            }
            ShellCommand::Payment { card, expiry, cvc } => {
                let input = PaymentInput {
                    card_number: card,
                    expiry_date: expiry,
                    cvc,
                };
                self.submit_payment(&input, out)?;
            }
            ShellCommand::Back => self.go_back(out)?,
            ShellCommand::Cancel => {
                if let Some(mut flow) = self.checkout.take() {
                    flow.cancel();
                    writeln!(out, "Checkout cancelled.")?;
                } else {
                    writeln!(out, "No checkout in progress.")?;
                }
            }
            ShellCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    fn print_results<W: Write>(&self, out: &mut W) -> Result<()> {
        let books = self.search.run(&self.catalog)?;
        writeln!(
            out,
            "Results for \"{}\" (page {}):",
            self.search.query(),
            self.search.page() + 1
        )?;
        if books.is_empty() {
            writeln!(out, "  No books found.")?;
        }
        for book in &books {
            let in_basket = self.cart.quantity_of(&book.id);
            write!(
                out,
                "  {}  {} - {}",
                book.id,
                headline(book),
                book.price_or_zero(self.currency)
            )?;
            if in_basket > 0 {
                write!(out, "  [in basket: {in_basket}]")?;
            }
            writeln!(out)?;
        }
        Ok(())
    }

    fn show<W: Write>(&self, id: &BookId, out: &mut W) -> Result<()> {
        let Some(book) = self.catalog.book(id)? else {
            writeln!(out, "No book with id {id}.")?;
            return Ok(());
        };

        writeln!(out, "{}", headline(&book))?;
        writeln!(out, "Price: {}", book.price_or_zero(self.currency))?;
        let description = book.plain_description();
        if !description.is_empty() {
            writeln!(out, "{description}")?;
        }
        if let Some(link) = &book.info_link {
            writeln!(out, "More info: {link}")?;
        }
        writeln!(out, "In basket: {}", self.cart.quantity_of(&book.id))?;
        Ok(())
    }

    // =========================================================================
    // Basket
    // =========================================================================

    fn add<W: Write>(&mut self, id: &BookId, out: &mut W) -> Result<()> {
        let Some(book) = self.catalog.book(id)? else {
            writeln!(out, "No book with id {id}.")?;
            return Ok(());
        };

        let before = self.cart.quantity_of(&book.id);
        if let Err(err) = self.cart.add_item(book.to_candidate(self.currency)) {
            writeln!(out, "Cannot add {}: {err}.", book.title)?;
            return Ok(());
        }
        if before == 0 {
            writeln!(out, "{} added to basket.", book.title)?;
        } else {
            writeln!(
                out,
                "Quantity of {} increased to {}.",
                book.title,
                self.cart.quantity_of(&book.id)
            )?;
        }
        Ok(())
    }

    fn report_quantity<W: Write>(&self, id: &BookId, update: CartUpdate, out: &mut W) -> Result<()> {
        match (update, self.cart.get(id)) {
            (CartUpdate::NotFound, _) => writeln!(out, "{id} is not in the basket.")?,
            (CartUpdate::Applied, Some(line)) => {
                writeln!(out, "{}: quantity {}.", line.title, line.quantity)?;
            }
            (CartUpdate::Applied, None) => writeln!(out, "Removed {id} from the basket.")?,
        }
        Ok(())
    }

    fn print_cart<W: Write>(&self, out: &mut W) -> Result<()> {
        if self.cart.is_empty() {
            writeln!(out, "Your basket is empty.")?;
            return Ok(());
        }

        writeln!(out, "Basket:")?;
        for line in self.cart.items() {
            writeln!(
                out,
                "  {} x {} ({}) @ {} = {}  [{}]",
                line.quantity,
                line.title,
                line.authors_display(),
                line.unit_price,
                line.line_total(),
                line.id
            )?;
        }
        writeln!(out, "Total items: {}", self.cart.total_item_count())?;
        writeln!(out, "Total amount: {}", self.cart.total_price())?;
        Ok(())
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    fn start_checkout<W: Write>(&mut self, out: &mut W) -> Result<()> {
        if let Some(step) = self.checkout.as_ref().and_then(CheckoutFlow::step) {
            writeln!(out, "Checkout already in progress ({step} step).")?;
            return Ok(());
        }
        if self.cart.is_empty() {
            writeln!(out, "Your basket is empty.")?;
            return Ok(());
        }

        self.checkout = Some(CheckoutFlow::start());
        writeln!(out, "Checkout started. Step 1 of 2: address.")?;
        Ok(())
    }

    fn submit_address<W: Write>(&mut self, input: &AddressInput, out: &mut W) -> Result<()> {
        let Some(flow) = self.checkout.as_mut() else {
            writeln!(out, "No checkout in progress. Run `checkout` first.")?;
            return Ok(());
        };
        if flow.step() == Some(CheckoutStep::Address) && !input.is_complete() {
            writeln!(out, "Fill in all fields to continue.")?;
            return Ok(());
        }

        match flow.submit_address(input) {
            Ok(_) => writeln!(out, "Address saved. Step 2 of 2: payment.")?,
            Err(err) => write_checkout_error(&err, out)?,
        }
        Ok(())
    }

    fn submit_payment<W: Write>(&mut self, input: &PaymentInput, out: &mut W) -> Result<()> {
        let Some(flow) = self.checkout.as_mut() else {
            writeln!(out, "No checkout in progress. Run `checkout` first.")?;
            return Ok(());
        };
        if flow.step() == Some(CheckoutStep::Payment) && !input.is_complete() {
            writeln!(out, "Fill in all fields to continue.")?;
            return Ok(());
        }

        match flow.submit_payment(input, &mut self.cart) {
            Ok(receipt) => {
                self.checkout = None;
                write_receipt(&receipt, out)?;
            }
            Err(err) => write_checkout_error(&err, out)?,
        }
        Ok(())
    }

    fn go_back<W: Write>(&mut self, out: &mut W) -> Result<()> {
        let Some(flow) = self.checkout.as_mut() else {
            writeln!(out, "No checkout in progress.")?;
            return Ok(());
        };

        match flow.go_back_to_address() {
            Ok(_) => {
                writeln!(out, "Back to step 1 of 2: address.")?;
                if let Some(saved) = flow.session().and_then(|session| session.address()) {
                    writeln!(
                        out,
                        "Saved: {} {}, {}",
                        saved.first_name, saved.last_name, saved.address
                    )?;
                }
            }
            Err(err) => write_checkout_error(&err, out)?,
        }
        Ok(())
    }
}

fn headline(book: &BookRecord) -> String {
    if book.authors.is_empty() {
        book.title.clone()
    } else {
        format!("{} by {}", book.title, book.authors.join(", "))
    }
}

fn write_checkout_error<W: Write>(err: &CheckoutError, out: &mut W) -> Result<()> {
    match err.validation() {
        Some(errors) => {
            writeln!(out, "Please fix the following:")?;
            for error in errors.errors() {
                writeln!(out, "  {}: {}", error.field, error.message)?;
            }
        }
        None => writeln!(out, "{err}.")?,
    }
    Ok(())
}

fn write_receipt<W: Write>(receipt: &CheckoutReceipt, out: &mut W) -> Result<()> {
    writeln!(out, "Payment successful!")?;
    writeln!(
        out,
        "Shipping to {} {}, {}",
        receipt.address.first_name, receipt.address.last_name, receipt.address.address
    )?;
    writeln!(
        out,
        "{} item(s), total {} charged to {} (exp {}).",
        receipt.item_count, receipt.total, receipt.card, receipt.expiry
    )?;
    writeln!(out, "Order reference: {}", receipt.session_id)?;
    Ok(())
}

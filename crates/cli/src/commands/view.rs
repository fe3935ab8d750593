//! Terminal presentation of the cart and its notices.

use std::fmt::Write as _;

use rocketshoes_cart::{Cart, Notice, Notifier};
use rocketshoes_core::CurrencyCode;

/// Longest title shown before truncating.
const TITLE_WIDTH: usize = 40;

/// Prints notices to stderr, like a toast.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    #[allow(clippy::print_stderr)]
    fn notify(&self, notice: Notice) {
        let marker = if notice.is_error() { "✗" } else { "✓" };
        eprintln!("{marker} {notice}");
    }
}

/// Print rendered output to stdout.
#[allow(clippy::print_stdout)]
pub fn print(rendered: &str) {
    print!("{rendered}");
}

/// Render the cart as a table with line totals and a subtotal.
#[must_use]
pub fn render_cart(cart: &Cart, currency: CurrencyCode) -> String {
    if cart.is_empty() {
        return "Cart is empty\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>4}  {:<TITLE_WIDTH$}  {:>12}  {:>6}  {:>12}",
        "ID", "PRODUCT", "PRICE", "QTY", "SUBTOTAL"
    );
    for item in cart {
        let _ = writeln!(
            out,
            "{:>4}  {:<TITLE_WIDTH$}  {:>12}  {:>6}  {:>12}",
            item.id(),
            truncate(&item.product.title, TITLE_WIDTH),
            item.product.unit_price(currency).to_string(),
            item.amount,
            item.line_total(currency).to_string(),
        );
    }
    let _ = writeln!(
        out,
        "{} item(s), {} unit(s), total {}",
        cart.len(),
        cart.total_quantity(),
        cart.subtotal(currency)
    );
    out
}

fn truncate(title: &str, width: usize) -> String {
    if title.chars().count() <= width {
        return title.to_string();
    }
    let mut short: String = title.chars().take(width.saturating_sub(1)).collect();
    short.push('…');
    short
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn cart_json() -> &'static str {
        r#"[
            {"id": 1, "title": "Tênis de Caminhada Leve Confortável", "price": 179.9, "image": "1.jpg", "amount": 2},
            {"id": 2, "title": "Tênis VR Caminhada Confortável Detalhes Couro Masculino", "price": 139.9, "image": "2.jpg", "amount": 1}
        ]"#
    }

    #[test]
    fn test_render_empty_cart() {
        assert_eq!(render_cart(&Cart::new(), CurrencyCode::BRL), "Cart is empty\n");
    }

    #[test]
    fn test_render_cart_lines_and_total() {
        let cart: Cart = serde_json::from_str(cart_json()).unwrap();
        let rendered = render_cart(&cart, CurrencyCode::BRL);
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[1].contains("Tênis de Caminhada Leve Confortável"));
        assert!(lines[1].contains("R$179.90"));
        assert!(lines[1].contains("R$359.80"));
        assert!(lines[2].contains('…'));
        assert_eq!(lines[3], "2 item(s), 3 unit(s), total R$499.70");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }
}

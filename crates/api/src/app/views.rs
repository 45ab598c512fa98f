//! Server-rendered HTML pages.
//!
//! Every interpolated value goes through [`escape`].

use std::fmt::Write;

use chemstock_core::Entity;
use chemstock_infra::store::{InventoryLine, MovementLine};
use chemstock_products::Product;

use crate::app::errors::Flash;

/// Escape text for use in HTML element content and quoted attributes.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Stock amount for display: at most six decimals, trailing zeros dropped,
/// so float noise (`0.30000000000000004`) never reaches the page.
pub fn format_amount(value: f64) -> String {
    let fixed = format!("{value:.6}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" => "0".to_string(),
        other => other.to_string(),
    }
}

fn layout(title: &str, flash: Option<&Flash>, body: &str) -> String {
    let banner = match flash {
        Some(flash) => format!(
            r#"<p class="flash {}" role="status">{}</p>"#,
            if flash.is_error() { "error" } else { "notice" },
            escape(flash.message())
        ),
        None => String::new(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title} | ChemStock</title>
<style>
body {{ font-family: sans-serif; margin: 2rem; }}
table {{ border-collapse: collapse; }}
th, td {{ border: 1px solid #ccc; padding: 0.3rem 0.6rem; text-align: left; }}
.flash {{ padding: 0.5rem; }}
.flash.notice {{ background: #e6f4ea; }}
.flash.error {{ background: #fce8e6; }}
</style>
</head>
<body>
<nav><a href="/">Home</a> | <a href="/products">Products</a> | <a href="/inventory">Inventory</a> | <a href="/stock-history">Stock history</a></nav>
<h1>{title}</h1>
{banner}
{body}
</body>
</html>
"#,
        title = escape(title),
    )
}

pub fn landing_page() -> String {
    layout(
        "Chemical inventory",
        None,
        r#"<ul>
<li><a href="/products">Manage products</a></li>
<li><a href="/inventory">View and adjust stock</a></li>
<li><a href="/stock-history">Browse stock movements</a></li>
</ul>"#,
    )
}

pub fn products_page(products: &[Product], search: Option<&str>, flash: Option<&Flash>) -> String {
    let mut body = String::new();

    let _ = write!(
        body,
        r#"<form method="get" action="/products">
<input type="search" name="q" value="{}" placeholder="Name or CAS number">
<button type="submit">Search</button>
</form>
"#,
        escape(search.unwrap_or_default())
    );

    body.push_str(
        r#"<h2>Add product</h2>
<form method="post" action="/products">
<label>Name <input name="name" required maxlength="100"></label>
<label>CAS number <input name="cas_number" required maxlength="50"></label>
<label>Unit <input name="unit" required maxlength="20"></label>
<label>Initial quantity <input name="quantity" type="number" step="any" min="0" required></label>
<button type="submit">Add</button>
</form>
"#,
    );

    if products.is_empty() {
        body.push_str("<p>No products found.</p>");
    } else {
        body.push_str(
            "<table>\n<tr><th>Name</th><th>CAS number</th><th>Unit</th><th></th></tr>\n",
        );
        for p in products {
            let _ = writeln!(
                body,
                r#"<tr><td>{}</td><td>{}</td><td>{}</td><td><form method="post" action="/delete-product/{}"><button type="submit">Delete</button></form></td></tr>"#,
                escape(p.name()),
                escape(p.identifier().as_str()),
                escape(p.unit()),
                p.id()
            );
        }
        body.push_str("</table>");
    }

    layout("Products", flash, &body)
}

pub fn inventory_page(lines: &[InventoryLine], flash: Option<&Flash>) -> String {
    let mut body = String::new();

    if lines.is_empty() {
        body.push_str(r#"<p>No inventory yet. <a href="/products">Add a product</a>.</p>"#);
    } else {
        body.push_str(
            "<table>\n<tr><th>Product</th><th>CAS number</th><th>Current stock</th><th>Adjust</th></tr>\n",
        );
        for line in lines {
            let _ = writeln!(
                body,
                r#"<tr><td>{}</td><td>{}</td><td>{} {}</td><td><form method="post" action="/update-stock/{}"><input name="quantity" type="number" step="any" min="0" required><select name="type"><option value="IN">IN</option><option value="OUT">OUT</option></select><button type="submit">Update</button></form></td></tr>"#,
                escape(&line.product_name),
                escape(&line.identifier),
                format_amount(line.record.current_stock()),
                escape(&line.unit),
                line.record.id()
            );
        }
        body.push_str("</table>");
    }

    layout("Inventory", flash, &body)
}

pub fn history_page(lines: &[MovementLine]) -> String {
    let mut body = String::new();

    if lines.is_empty() {
        body.push_str("<p>No stock movements recorded.</p>");
    } else {
        body.push_str(
            "<table>\n<tr><th>When (UTC)</th><th>Product</th><th>Type</th><th>Quantity</th></tr>\n",
        );
        for line in lines {
            let m = &line.movement;
            let _ = writeln!(
                body,
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{} {}</td></tr>",
                m.created_at().format("%Y-%m-%d %H:%M:%S"),
                escape(&line.product_name),
                m.movement_type(),
                format_amount(m.quantity().get()),
                escape(&line.unit)
            );
        }
        body.push_str("</table>");
    }

    layout("Stock history", None, &body)
}

pub fn error_page(message: &str) -> String {
    layout("Something went wrong", Some(&Flash::error(message)), "")
}

use crate::domain::entities::{account::AccountId, invoice::Invoice};

const PRODUCT_PITCH: &str = "Sports car, 30 days trial for only $10.00!";

fn layout(body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Checkout</title></head>
<body>
{body}
</body>
</html>
"#
    )
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn landing_page() -> String {
    let body = format!(
        r#"<article>
  <label class="amount"><span>{PRODUCT_PITCH}</span></label>
</article>
<br/>
<a href="/redirect">Pay with PayPal</a>"#
    );
    layout(&body)
}

/// One list entry per invoice line.
pub fn invoice_page(invoice: &Invoice, phase_label: &str) -> String {
    let items: String = invoice
        .items
        .iter()
        .map(|item| {
            let start_date = item
                .start_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default();
            format!(
                "    <li>subscription_id={}, amount={:.2}, phase={}, start_date={}</li>\n",
                escape_html(item.subscription_id.as_deref().unwrap_or_default()),
                item.amount,
                escape_html(phase_label),
                start_date
            )
        })
        .collect();

    let body = format!("<h2>Thanks! Here is your invoice:</h2>\n<ul>\n{items}</ul>");
    layout(&body)
}

pub fn cancelled_page(account_id: &AccountId) -> String {
    let body = format!(
        r#"<h2>Checkout cancelled</h2>
<p>No payment was taken for account {}.</p>
<a href="/">Back to the offer</a>"#,
        escape_html(account_id.as_str())
    );
    layout(&body)
}

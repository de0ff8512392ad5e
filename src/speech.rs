/// Spoken sentences for account balances
///
/// Turns an account record into the sentence the assistant reads out:
/// 1. Pick a speakable account name
/// 2. Render the balance as words the speech engine pronounces correctly
/// 3. Phrase the sentence by account category
use crate::models::{Account, AccountCategory};

/// Scale words for every thousands group above the last one.
const SCALES: &[&str] = &[
    "thousand",
    "million",
    "billion",
    "trillion",
    "quadrillion",
    "quintillion",
];

/// Name the owner gave the account, or `"<login display name> <aggregator name>"`.
pub fn speakable_name(account: &Account) -> String {
    match account.user_name.as_deref() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!(
            "{} {}",
            account.fi_login_display_name.as_deref().unwrap_or(""),
            account.yodlee_name.as_deref().unwrap_or("")
        )
        .trim()
        .to_string(),
    }
}

/// Render a currency amount for speech.
///
/// Rounds half away from zero to cents, then speaks each thousands group
/// with its scale word: `1234.56` becomes `"1 thousand 234 dollars and 56 cents"`.
/// Zero groups below the leading one are skipped, so `1000` is
/// `"1 thousand dollars"`. Zero cents are not spoken.
pub fn render_balance(amount: f64) -> String {
    let total_cents = to_cents(amount);
    let sign = if amount < 0.0 && total_cents != 0 {
        "-"
    } else {
        ""
    };
    let dollars = total_cents / 100;
    let cents = total_cents % 100;

    let mut groups = Vec::new();
    let mut rest = dollars;
    loop {
        groups.push(rest % 1000);
        rest /= 1000;
        if rest == 0 {
            break;
        }
    }
    groups.reverse();

    let mut text = if groups.len() == 1 {
        format!("{}{} dollars", sign, dollars)
    } else {
        let last = groups.len() - 1;
        let mut parts = Vec::with_capacity(groups.len());
        for (i, group) in groups.iter().enumerate() {
            if i == last {
                if *group == 0 {
                    parts.push("dollars".to_string());
                } else {
                    parts.push(format!("{} dollars", group));
                }
            } else if i == 0 {
                parts.push(format!("{}{} {}", sign, group, SCALES[last - i - 1]));
            } else if *group != 0 {
                parts.push(format!("{} {}", group, SCALES[last - i - 1]));
            }
        }
        parts.join(" ")
    };

    if cents != 0 {
        text.push_str(&format!(" and {} cents", cents));
    }

    text
}

/// Absolute amount in whole cents, rounded half away from zero.
///
/// The scaled value is first cut to 15 significant digits so an input such
/// as `1.005`, stored as `1.00499...`, rounds the way it is written.
fn to_cents(amount: f64) -> u64 {
    let scaled = amount.abs() * 100.0;
    let pre_rounded = format!("{:.14e}", scaled)
        .parse::<f64>()
        .unwrap_or(scaled);
    pre_rounded.round() as u64
}

/// Build the full spoken sentence for an account.
pub fn describe(account: &Account) -> String {
    let name = speakable_name(account);
    // Amounts that round to zero cents are spoken as empty, not "0 dollars"
    let is_zero = to_cents(account.current_balance) == 0;

    match account.category() {
        AccountCategory::Credit | AccountCategory::Loan => {
            if is_zero {
                format!("You owe nothing on your {} account.", name)
            } else {
                format!(
                    "You owe {} on your {} account.",
                    render_balance(account.current_balance),
                    name
                )
            }
        }
        // Investment and unknown types are phrased like bank accounts
        AccountCategory::Bank | AccountCategory::Other => {
            if is_zero {
                format!("Your {} account is empty.", name)
            } else {
                format!(
                    "Your {} account balance is {}.",
                    name,
                    render_balance(account.current_balance)
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AccountId;
    use serde_json::Map;

    fn account(user_name: Option<&str>, account_type: &str, balance: f64) -> Account {
        Account {
            id: AccountId::Number(1),
            user_name: user_name.map(str::to_string),
            fi_login_display_name: Some("Chase".to_string()),
            yodlee_name: Some("Sapphire Preferred".to_string()),
            account_name: None,
            fi_name: None,
            account_type: Some(account_type.to_string()),
            current_balance: balance,
            extra: Map::new(),
        }
    }

    #[test]
    fn test_bank_sentences() {
        assert_eq!(
            describe(&account(Some("Checking"), "bank", 0.0)),
            "Your Checking account is empty."
        );
        assert_eq!(
            describe(&account(Some("Savings"), "bank", 500.0)),
            "Your Savings account balance is 500 dollars."
        );
    }

    #[test]
    fn test_debt_sentences() {
        assert_eq!(
            describe(&account(Some("Visa"), "credit", 1234.56)),
            "You owe 1 thousand 234 dollars and 56 cents on your Visa account."
        );
        assert_eq!(
            describe(&account(Some("Auto Loan"), "loan", 0.0)),
            "You owe nothing on your Auto Loan account."
        );
    }

    #[test]
    fn test_other_category_reads_like_bank() {
        assert_eq!(
            describe(&account(Some("Brokerage"), "investment", 42.5)),
            "Your Brokerage account balance is 42 dollars and 50 cents."
        );
        assert_eq!(
            describe(&account(Some("Brokerage"), "investment", 0.0)),
            "Your Brokerage account is empty."
        );
    }

    #[test]
    fn test_name_falls_back_to_institution_names() {
        assert_eq!(
            speakable_name(&account(None, "credit", 1.0)),
            "Chase Sapphire Preferred"
        );
        assert_eq!(
            speakable_name(&account(Some(""), "credit", 1.0)),
            "Chase Sapphire Preferred"
        );
    }

    #[test]
    fn test_render_small_amounts() {
        assert_eq!(render_balance(0.0), "0 dollars");
        assert_eq!(render_balance(7.05), "7 dollars and 5 cents");
        assert_eq!(render_balance(999.999), "1 thousand dollars");
        assert_eq!(render_balance(12.004), "12 dollars");
    }

    #[test]
    fn test_render_rounds_half_cents_up() {
        assert_eq!(render_balance(1.005), "1 dollars and 1 cents");
        assert_eq!(render_balance(0.285), "0 dollars and 29 cents");
        assert_eq!(render_balance(2.675), "2 dollars and 68 cents");
        assert_eq!(render_balance(-1.005), "-1 dollars and 1 cents");
        assert_eq!(render_balance(1.0049), "1 dollars");
    }

    #[test]
    fn test_sub_cent_balance_is_spoken_as_zero() {
        assert_eq!(
            describe(&account(Some("Checking"), "bank", 0.004)),
            "Your Checking account is empty."
        );
        assert_eq!(
            describe(&account(Some("Visa"), "credit", -0.001)),
            "You owe nothing on your Visa account."
        );
    }

    #[test]
    fn test_render_thousands() {
        assert_eq!(render_balance(1000.0), "1 thousand dollars");
        assert_eq!(render_balance(1005.0), "1 thousand 5 dollars");
        assert_eq!(
            render_balance(98765.4),
            "98 thousand 765 dollars and 40 cents"
        );
    }

    #[test]
    fn test_render_millions() {
        assert_eq!(
            render_balance(1234567.0),
            "1 million 234 thousand 567 dollars"
        );
        assert_eq!(render_balance(2000000.0), "2 million dollars");
        assert_eq!(render_balance(3000042.0), "3 million 42 dollars");
        assert_eq!(
            render_balance(1002003004.0),
            "1 billion 2 million 3 thousand 4 dollars"
        );
    }

    #[test]
    fn test_render_negative() {
        assert_eq!(render_balance(-25.5), "-25 dollars and 50 cents");
        assert_eq!(
            render_balance(-1234.56),
            "-1 thousand 234 dollars and 56 cents"
        );
        assert_eq!(render_balance(-0.001), "0 dollars");
    }
}

use chrono::{Datelike, NaiveDate};
use nexttrip_shared::Masked;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{required, ValidationError};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Card,
    Momo,
    Bank,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::Momo => "momo",
            PaymentMethod::Bank => "bank",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MomoProvider {
    #[serde(rename = "MTN")]
    Mtn,
    Vodafone,
    AirtelTigo,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BillingAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
}

impl BillingAddress {
    pub fn validate(&self) -> Result<(), ValidationError> {
        required("street", &self.street)?;
        required("city", &self.city)?;
        required("state", &self.state)?;
        required("zip", &self.zip)?;
        required("country", &self.country)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardPayment {
    pub card_holder_name: String,
    pub card_number: Masked<String>,
    /// `MM/YY`
    pub expiry: String,
    pub cvv: Masked<String>,
    pub billing_address: BillingAddress,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MobileMoneyPayment {
    pub provider: MomoProvider,
    pub phone_number: String,
    pub country: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BankDepositPayment {
    pub bank_name: String,
    pub account_number: Masked<String>,
    pub deposit_reference: String,
    pub country: String,
    pub billing_address: BillingAddress,
}

/// The payment instrument chosen on the active tab.
///
/// Only one variant can exist, so fields typed into a tab the customer later
/// left can never reach the booking request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum PaymentInstrument {
    Card(CardPayment),
    Momo(MobileMoneyPayment),
    Bank(BankDepositPayment),
}

impl PaymentInstrument {
    pub fn method(&self) -> PaymentMethod {
        match self {
            PaymentInstrument::Card(_) => PaymentMethod::Card,
            PaymentInstrument::Momo(_) => PaymentMethod::Momo,
            PaymentInstrument::Bank(_) => PaymentMethod::Bank,
        }
    }

    pub fn billing_address(&self) -> Option<&BillingAddress> {
        match self {
            PaymentInstrument::Card(card) => Some(&card.billing_address),
            PaymentInstrument::Bank(bank) => Some(&bank.billing_address),
            PaymentInstrument::Momo(_) => None,
        }
    }

    pub fn validate(&self, today: NaiveDate) -> Result<(), ValidationError> {
        match self {
            PaymentInstrument::Card(card) => {
                required("card_holder_name", &card.card_holder_name)?;
                validate_card_number(card.card_number.expose())?;
                validate_expiry(&card.expiry, today)?;
                validate_cvv(card.cvv.expose())?;
                card.billing_address.validate()
            }
            PaymentInstrument::Momo(momo) => {
                required("phone_number", &momo.phone_number)?;
                required("country", &momo.country)?;
                let digits = momo.phone_number.chars().filter(char::is_ascii_digit).count();
                if !(9..=12).contains(&digits) {
                    return Err(ValidationError::invalid("phone_number", "expected 9 to 12 digits"));
                }
                Ok(())
            }
            PaymentInstrument::Bank(bank) => {
                required("bank_name", &bank.bank_name)?;
                required("account_number", bank.account_number.expose())?;
                required("deposit_reference", &bank.deposit_reference)?;
                required("country", &bank.country)?;
                bank.billing_address.validate()
            }
        }
    }
}

fn validate_card_number(raw: &str) -> Result<(), ValidationError> {
    required("card_number", raw)?;
    let digits: Vec<u32> = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .map(|c| c.to_digit(10).ok_or_else(|| ValidationError::invalid("card_number", "digits only")))
        .collect::<Result<_, _>>()?;

    if !(12..=19).contains(&digits.len()) {
        return Err(ValidationError::invalid("card_number", "expected 12 to 19 digits"));
    }

    // Luhn
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();
    if sum % 10 != 0 {
        return Err(ValidationError::invalid("card_number", "checksum mismatch"));
    }
    Ok(())
}

fn validate_expiry(raw: &str, today: NaiveDate) -> Result<(), ValidationError> {
    required("expiry", raw)?;
    let bad = || ValidationError::invalid("expiry", "expected MM/YY");
    let (mm, yy) = raw.trim().split_once('/').ok_or_else(bad)?;
    if mm.len() != 2 || yy.len() != 2 {
        return Err(bad());
    }
    let month: u32 = mm.parse().map_err(|_| bad())?;
    let year: i32 = yy.parse::<i32>().map_err(|_| bad())? + 2000;
    if !(1..=12).contains(&month) {
        return Err(bad());
    }
    if (year, month) < (today.year(), today.month()) {
        return Err(ValidationError::invalid("expiry", "card has expired"));
    }
    Ok(())
}

fn validate_cvv(raw: &str) -> Result<(), ValidationError> {
    required("cvv", raw)?;
    let cvv = raw.trim();
    if !(3..=4).contains(&cvv.len()) || !cvv.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::invalid("cvv", "expected 3 or 4 digits"));
    }
    Ok(())
}

/// `payment_details` as `POST /bookflight` expects it: every key present,
/// the ones belonging to other methods set to `null`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PaymentDetails {
    pub card_name: Option<String>,
    pub card_number: Option<Masked<String>>,
    pub expiry: Option<String>,
    pub cvv: Option<Masked<String>>,
    pub momo_provider: Option<MomoProvider>,
    pub momo_number: Option<String>,
    pub bank_name: Option<String>,
    pub account_number: Option<Masked<String>>,
    pub deposit_ref: Option<String>,
    pub country: Option<String>,
    pub address: Option<BillingAddress>,
}

impl From<&PaymentInstrument> for PaymentDetails {
    fn from(instrument: &PaymentInstrument) -> Self {
        match instrument {
            PaymentInstrument::Card(card) => PaymentDetails {
                card_name: Some(card.card_holder_name.trim().to_string()),
                card_number: Some(card.card_number.clone()),
                expiry: Some(card.expiry.trim().to_string()),
                cvv: Some(card.cvv.clone()),
                country: Some(card.billing_address.country.clone()),
                address: Some(card.billing_address.clone()),
                ..Default::default()
            },
            PaymentInstrument::Momo(momo) => PaymentDetails {
                momo_provider: Some(momo.provider),
                momo_number: Some(momo.phone_number.trim().to_string()),
                country: Some(momo.country.clone()),
                ..Default::default()
            },
            PaymentInstrument::Bank(bank) => PaymentDetails {
                bank_name: Some(bank.bank_name.trim().to_string()),
                account_number: Some(bank.account_number.clone()),
                deposit_ref: Some(bank.deposit_reference.trim().to_string()),
                country: Some(bank.country.clone()),
                address: Some(bank.billing_address.clone()),
                ..Default::default()
            },
        }
    }
}

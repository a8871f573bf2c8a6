//! Canonical currency and instrument model.
//!
//! Every exchange spells assets and pairs differently; this module is the
//! shared vocabulary the adapters translate into and out of. The well-known
//! currency set is a process-wide constant table, normalization is total
//! (unknown symbols are accepted verbatim, upper-cased) and malformed pair
//! symbols collapse to the [`UNKNOWN_PAIR`] sentinel instead of failing.

use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A currency identified by its canonical upper-case symbol.
///
/// Identity is the symbol alone; two values with the same symbol are
/// interchangeable regardless of description.
#[derive(Clone, Debug)]
pub struct Currency {
    pub symbol: Cow<'static, str>,
    pub desc: Cow<'static, str>,
}

impl Currency {
    const fn constant(symbol: &'static str, desc: &'static str) -> Self {
        Currency {
            symbol: Cow::Borrowed(symbol),
            desc: Cow::Borrowed(desc),
        }
    }

    /// Total, case-insensitive normalization from a raw symbol string.
    ///
    /// Known aliases resolve to their canonical registry value (so `"btc"`
    /// and `"BTC"` are the same currency); anything else is synthesized from
    /// the upper-cased input. Empty input yields [`UNKNOWN`].
    pub fn new(symbol: &str, desc: &str) -> Currency {
        if symbol.is_empty() {
            return UNKNOWN;
        }
        let upper = symbol.to_ascii_uppercase();
        for known in REGISTRY {
            if known.symbol == upper.as_str() {
                return known.clone();
            }
        }
        Currency {
            symbol: Cow::Owned(upper),
            desc: Cow::Owned(desc.to_string()),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }
}

impl PartialEq for Currency {
    fn eq(&self, other: &Self) -> bool {
        self.symbol == other.symbol
    }
}

impl Eq for Currency {}

impl Hash for Currency {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.symbol.hash(state);
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbol)
    }
}

/// An ordered base/quote instrument, independent of any exchange dialect.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CurrencyPair {
    pub base: Currency,
    pub quote: Currency,
}

impl CurrencyPair {
    pub const fn new(base: Currency, quote: Currency) -> CurrencyPair {
        CurrencyPair { base, quote }
    }

    /// Parses a combined `BASE_QUOTE` symbol. Anything that does not split
    /// into exactly two tokens yields [`UNKNOWN_PAIR`].
    pub fn from_symbol(combined: &str) -> CurrencyPair {
        let mut parts = combined.split('_');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(base), Some(quote), None) if !base.is_empty() && !quote.is_empty() => {
                CurrencyPair::new(Currency::new(base, ""), Currency::new(quote, ""))
            }
            _ => UNKNOWN_PAIR,
        }
    }

    /// Renders base then quote, joined by `join`.
    pub fn to_symbol(&self, join: &str) -> String {
        format!("{}{}{}", self.base.symbol, join, self.quote.symbol)
    }

    /// Renders quote then base. Some exchanges key their ticker endpoints by
    /// quote-base order.
    pub fn to_symbol_reversed(&self, join: &str) -> String {
        format!("{}{}{}", self.quote.symbol, join, self.base.symbol)
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_symbol("_"))
    }
}

// ============================================================================
// Currency registry
// ============================================================================

pub const UNKNOWN: Currency = Currency::constant("UNKNOWN", "");
pub const CNY: Currency = Currency::constant("CNY", "rmb (China Yuan)");
pub const USD: Currency = Currency::constant("USD", "USA dollar");
pub const USDT: Currency = Currency::constant("USDT", "http://tether.io");
pub const EUR: Currency = Currency::constant("EUR", "");
pub const KRW: Currency = Currency::constant("KRW", "");
pub const JPY: Currency = Currency::constant("JPY", "japanese yen");
pub const BTC: Currency = Currency::constant("BTC", "bitcoin.org");
pub const XBT: Currency = Currency::constant("XBT", "bitcoin.org");
pub const BCC: Currency = Currency::constant("BCC", "bitcoin-abc");
pub const BCH: Currency = Currency::constant("BCH", "bitcoin-abc");
pub const BCX: Currency = Currency::constant("BCX", "");
pub const LTC: Currency = Currency::constant("LTC", "litecoin.org");
pub const ETH: Currency = Currency::constant("ETH", "");
pub const ETC: Currency = Currency::constant("ETC", "");
pub const EOS: Currency = Currency::constant("EOS", "");
pub const BTS: Currency = Currency::constant("BTS", "");
pub const QTUM: Currency = Currency::constant("QTUM", "");
pub const SC: Currency = Currency::constant("SC", "sia.tech");
pub const ANS: Currency = Currency::constant("ANS", "www.antshares.org");
pub const ZEC: Currency = Currency::constant("ZEC", "");
pub const DCR: Currency = Currency::constant("DCR", "");
pub const XRP: Currency = Currency::constant("XRP", "");
pub const BTG: Currency = Currency::constant("BTG", "");
pub const BCD: Currency = Currency::constant("BCD", "");
pub const NEO: Currency = Currency::constant("NEO", "neo.org");
pub const HSR: Currency = Currency::constant("HSR", "");
pub const IOTA: Currency = Currency::constant("IOTA", "");
pub const XMR: Currency = Currency::constant("XMR", "");
pub const DASH: Currency = Currency::constant("DASH", "");
pub const OMG: Currency = Currency::constant("OMG", "");
pub const TRX: Currency = Currency::constant("TRX", "");
pub const ZRX: Currency = Currency::constant("ZRX", "");
pub const SNT: Currency = Currency::constant("SNT", "");
pub const BAT: Currency = Currency::constant("BAT", "");
pub const GNT: Currency = Currency::constant("GNT", "");
pub const REP: Currency = Currency::constant("REP", "");
pub const XLM: Currency = Currency::constant("XLM", "");
pub const XDG: Currency = Currency::constant("XDG", "");
pub const ICN: Currency = Currency::constant("ICN", "");
pub const MLN: Currency = Currency::constant("MLN", "");
pub const GNO: Currency = Currency::constant("GNO", "");

static REGISTRY: &[Currency] = &[
    UNKNOWN, CNY, USD, USDT, EUR, KRW, JPY, BTC, XBT, BCC, BCH, BCX, LTC, ETH, ETC, EOS, BTS,
    QTUM, SC, ANS, ZEC, DCR, XRP, BTG, BCD, NEO, HSR, IOTA, XMR, DASH, OMG, TRX, ZRX, SNT, BAT,
    GNT, REP, XLM, XDG, ICN, MLN, GNO,
];

// ============================================================================
// Instrument constants
// ============================================================================

pub const BTC_CNY: CurrencyPair = CurrencyPair::new(BTC, CNY);
pub const LTC_CNY: CurrencyPair = CurrencyPair::new(LTC, CNY);
pub const ETH_CNY: CurrencyPair = CurrencyPair::new(ETH, CNY);
pub const ETC_CNY: CurrencyPair = CurrencyPair::new(ETC, CNY);

pub const BTC_KRW: CurrencyPair = CurrencyPair::new(BTC, KRW);
pub const ETH_KRW: CurrencyPair = CurrencyPair::new(ETH, KRW);

pub const BTC_USD: CurrencyPair = CurrencyPair::new(BTC, USD);
pub const LTC_USD: CurrencyPair = CurrencyPair::new(LTC, USD);
pub const ETH_USD: CurrencyPair = CurrencyPair::new(ETH, USD);
pub const ETC_USD: CurrencyPair = CurrencyPair::new(ETC, USD);
pub const BCH_USD: CurrencyPair = CurrencyPair::new(BCH, USD);
pub const XRP_USD: CurrencyPair = CurrencyPair::new(XRP, USD);
pub const NEO_USD: CurrencyPair = CurrencyPair::new(NEO, USD);
pub const EOS_USD: CurrencyPair = CurrencyPair::new(EOS, USD);
pub const IOTA_USD: CurrencyPair = CurrencyPair::new(IOTA, USD);
pub const XMR_USD: CurrencyPair = CurrencyPair::new(XMR, USD);
pub const DASH_USD: CurrencyPair = CurrencyPair::new(DASH, USD);
pub const ZEC_USD: CurrencyPair = CurrencyPair::new(ZEC, USD);
pub const QTUM_USD: CurrencyPair = CurrencyPair::new(QTUM, USD);
pub const XLM_USD: CurrencyPair = CurrencyPair::new(XLM, USD);

pub const BTC_USDT: CurrencyPair = CurrencyPair::new(BTC, USDT);
pub const LTC_USDT: CurrencyPair = CurrencyPair::new(LTC, USDT);
pub const BCH_USDT: CurrencyPair = CurrencyPair::new(BCH, USDT);
pub const ETC_USDT: CurrencyPair = CurrencyPair::new(ETC, USDT);
pub const ETH_USDT: CurrencyPair = CurrencyPair::new(ETH, USDT);
pub const NEO_USDT: CurrencyPair = CurrencyPair::new(NEO, USDT);
pub const EOS_USDT: CurrencyPair = CurrencyPair::new(EOS, USDT);
pub const XRP_USDT: CurrencyPair = CurrencyPair::new(XRP, USDT);

pub const XRP_EUR: CurrencyPair = CurrencyPair::new(XRP, EUR);

pub const BTC_JPY: CurrencyPair = CurrencyPair::new(BTC, JPY);
pub const LTC_JPY: CurrencyPair = CurrencyPair::new(LTC, JPY);

pub const LTC_BTC: CurrencyPair = CurrencyPair::new(LTC, BTC);
pub const ETH_BTC: CurrencyPair = CurrencyPair::new(ETH, BTC);
pub const ETC_BTC: CurrencyPair = CurrencyPair::new(ETC, BTC);
pub const BCH_BTC: CurrencyPair = CurrencyPair::new(BCH, BTC);
pub const DCR_BTC: CurrencyPair = CurrencyPair::new(DCR, BTC);
pub const XRP_BTC: CurrencyPair = CurrencyPair::new(XRP, BTC);
pub const NEO_BTC: CurrencyPair = CurrencyPair::new(NEO, BTC);
pub const EOS_BTC: CurrencyPair = CurrencyPair::new(EOS, BTC);

pub const ETC_ETH: CurrencyPair = CurrencyPair::new(ETC, ETH);
pub const EOS_ETH: CurrencyPair = CurrencyPair::new(EOS, ETH);
pub const ZEC_ETH: CurrencyPair = CurrencyPair::new(ZEC, ETH);
pub const NEO_ETH: CurrencyPair = CurrencyPair::new(NEO, ETH);

pub const UNKNOWN_PAIR: CurrencyPair = CurrencyPair::new(UNKNOWN, UNKNOWN);

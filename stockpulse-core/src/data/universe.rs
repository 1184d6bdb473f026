//! Reference watchlist: the fixed table of tickers the dashboard follows.
//!
//! The built-in table covers the IBEX 35 (domestic, `.MC` suffix) and a set
//! of large US listings. A TOML config may replace it with its own symbol
//! list; symbols found in the reference table keep their display names.

use crate::domain::{validate_search, Market, Ticker, ValidationError};

/// (symbol, display name) in display order.
pub const REFERENCE: &[(&str, &str)] = &[
    // Spain (IBEX 35)
    ("BBVA.MC", "BBVA"),
    ("SAN.MC", "Banco Santander"),
    ("ITX.MC", "Inditex (Zara)"),
    ("TEF.MC", "Telefónica"),
    ("IBE.MC", "Iberdrola"),
    ("REP.MC", "Repsol"),
    ("AENA.MC", "Aena"),
    ("AMS.MC", "Amadeus"),
    ("FER.MC", "Ferrovial"),
    ("ACS.MC", "ACS"),
    ("GRF.MC", "Grifols"),
    ("CLNX.MC", "Cellnex"),
    ("ENG.MC", "Enagás"),
    ("ELE.MC", "Endesa"),
    ("MAP.MC", "Mapfre"),
    ("SAB.MC", "Banco Sabadell"),
    ("BKT.MC", "Bankinter"),
    ("ACX.MC", "Acerinox"),
    ("MTS.MC", "ArcelorMittal"),
    ("IAG.MC", "IAG (Iberia)"),
    ("NTGY.MC", "Naturgy"),
    ("RED.MC", "Red Eléctrica"),
    ("COL.MC", "Colonial"),
    ("MER.MC", "Merlin Properties"),
    ("ANA.MC", "Acciona"),
    ("ANE.MC", "Acciona Energía"),
    ("LOG.MC", "Logista"),
    ("ROVI.MC", "Rovi"),
    ("SCYR.MC", "Sacyr"),
    ("SLR.MC", "Solaria"),
    ("UNI.MC", "Unicaja"),
    ("FDR.MC", "Fluidra"),
    ("MEL.MC", "Meliá Hoteles"),
    // United States
    ("AAPL", "Apple"),
    ("MSFT", "Microsoft"),
    ("GOOGL", "Google (Alphabet)"),
    ("AMZN", "Amazon"),
    ("TSLA", "Tesla"),
    ("META", "Meta (Facebook)"),
    ("NVDA", "Nvidia"),
    ("NFLX", "Netflix"),
    ("AMD", "AMD"),
    ("INTC", "Intel"),
    ("KO", "Coca-Cola"),
    ("PEP", "PepsiCo"),
    ("MCD", "McDonald's"),
    ("DIS", "Disney"),
    ("NKE", "Nike"),
    ("SBUX", "Starbucks"),
    ("WMT", "Walmart"),
    ("JPM", "JP Morgan"),
    ("V", "Visa"),
    ("MA", "Mastercard"),
    ("BRK-B", "Berkshire Hathaway"),
    ("CRM", "Salesforce"),
    ("ADBE", "Adobe"),
    ("PYPL", "PayPal"),
];

/// An ordered list of tickers to scan.
#[derive(Debug, Clone, PartialEq)]
pub struct Watchlist {
    tickers: Vec<Ticker>,
}

impl Watchlist {
    /// The built-in reference table.
    pub fn reference() -> Self {
        Self {
            tickers: REFERENCE
                .iter()
                .map(|(symbol, name)| Ticker::new(*symbol, *name))
                .collect(),
        }
    }

    /// A watchlist from bare symbols. Known symbols take their reference
    /// display name; unknown ones are kept literally.
    pub fn from_symbols<S: AsRef<str>>(symbols: &[S]) -> Self {
        let mut tickers: Vec<Ticker> = Vec::with_capacity(symbols.len());
        for s in symbols {
            let symbol = s.as_ref().trim().to_uppercase();
            if symbol.is_empty() || tickers.iter().any(|t| t.symbol == symbol) {
                continue;
            }
            tickers.push(lookup_symbol(&symbol).unwrap_or_else(|| Ticker::literal(symbol)));
        }
        Self { tickers }
    }

    /// The configured override, or the reference table.
    pub fn from_config(watchlist: Option<&[String]>) -> Self {
        match watchlist {
            Some(symbols) if !symbols.is_empty() => Self::from_symbols(symbols),
            _ => Self::reference(),
        }
    }

    pub fn tickers(&self) -> &[Ticker] {
        &self.tickers
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }

    pub fn count(&self, market: Market) -> usize {
        self.tickers.iter().filter(|t| t.market == market).count()
    }

    pub fn get(&self, symbol: &str) -> Option<&Ticker> {
        self.tickers.iter().find(|t| t.symbol == symbol)
    }

    /// Resolve free text to a ticker.
    ///
    /// Order of attempts: exact symbol (case-insensitive), then the first
    /// display name containing the text (case-insensitive), then the text
    /// itself upper-cased as a literal symbol.
    pub fn resolve(&self, text: &str) -> Result<Ticker, ValidationError> {
        let needle = validate_search(text)?.to_uppercase();

        if let Some(t) = self.tickers.iter().find(|t| t.symbol == needle) {
            return Ok(t.clone());
        }
        if let Some(t) = self
            .tickers
            .iter()
            .find(|t| t.name.to_uppercase().contains(&needle))
        {
            return Ok(t.clone());
        }
        Ok(Ticker::literal(needle))
    }
}

impl Default for Watchlist {
    fn default() -> Self {
        Self::reference()
    }
}

/// Reference-table entry for a symbol.
pub fn lookup_symbol(symbol: &str) -> Option<Ticker> {
    REFERENCE
        .iter()
        .find(|(s, _)| *s == symbol)
        .map(|(s, name)| Ticker::new(*s, *name))
}

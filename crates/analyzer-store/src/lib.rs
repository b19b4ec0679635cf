#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/blueprint-analytics/stock-analyzer/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use analyzer_core::{
    AnalysisError, CompanyProfile, EconomicIndicatorKind, EconomicPoint, RatioSnapshot,
    ReportPeriod, Result, StatementRecord, StatementType, Symbol,
};
use analyzer_indicators::IndicatorSnapshot;
use analyzer_scoring::{Recommendation, ScoreBreakdown};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

// ============================================================================
// Row types
// ============================================================================

/// A saved analysis report grouping one or more stock analyses.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    /// Database row ID.
    pub id: i64,
    /// User-chosen report name.
    pub name: String,
    /// Free-form report category, e.g. `"watchlist"` or `"deep_dive"`.
    pub report_type: String,
    /// Optional longer description.
    pub description: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// A single stock analysis attached to a report.
#[derive(Debug, Clone, PartialEq)]
pub struct StockAnalysis {
    /// Database row ID.
    pub id: i64,
    /// Owning report.
    pub report_id: i64,
    /// Analyzed symbol.
    pub symbol: Symbol,
    /// Full analysis result as JSON.
    pub analysis: serde_json::Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Store
// ============================================================================

/// SQLite-backed persistence for reports and analysis results.
///
/// The connection is wrapped in a [`Mutex`] so the store can be shared
/// across tasks; every operation takes the lock for its duration.
#[derive(Debug)]
pub struct AnalysisStore {
    conn: Mutex<Connection>,
}

impl AnalysisStore {
    /// Open (or create) a store at the given database path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or schema creation
    /// fails.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| AnalysisError::Store(e.to_string()))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Create an in-memory store.
    ///
    /// Useful for testing; data is lost when the store is dropped.
    ///
    /// # Errors
    /// Returns an error if schema creation fails.
    pub fn in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| AnalysisError::Store(e.to_string()))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| AnalysisError::Store(e.to_string()))?;

        conn.execute_batch(
            "PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS reports (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                report_type TEXT NOT NULL,
                description TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS stock_analyses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                report_id INTEGER NOT NULL REFERENCES reports(id) ON DELETE CASCADE,
                symbol TEXT NOT NULL,
                analysis_result TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_stock_analyses_report
             ON stock_analyses(report_id);

            CREATE TABLE IF NOT EXISTS company_profiles (
                symbol TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                sector TEXT,
                industry TEXT,
                description TEXT,
                country TEXT,
                website TEXT,
                logo_url TEXT,
                employee_count INTEGER,
                market_cap REAL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS financial_statements (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                symbol TEXT NOT NULL,
                statement_type TEXT NOT NULL,
                period_type TEXT NOT NULL,
                fiscal_year INTEGER NOT NULL,
                fiscal_period TEXT NOT NULL,
                filing_date TEXT NOT NULL,
                data_json TEXT NOT NULL,
                source TEXT NOT NULL,
                UNIQUE(symbol, statement_type, period_type, fiscal_year, fiscal_period)
            );

            CREATE TABLE IF NOT EXISTS valuation_metrics (
                symbol TEXT NOT NULL,
                date TEXT NOT NULL,
                profit_margin REAL,
                roe REAL,
                roa REAL,
                debt_to_equity REAL,
                source TEXT NOT NULL,
                PRIMARY KEY (symbol, date)
            );

            CREATE TABLE IF NOT EXISTS technical_indicators (
                symbol TEXT NOT NULL,
                date TEXT NOT NULL,
                data_json TEXT NOT NULL,
                PRIMARY KEY (symbol, date)
            );

            CREATE TABLE IF NOT EXISTS investment_scores (
                symbol TEXT NOT NULL,
                date TEXT NOT NULL,
                valuation_score REAL NOT NULL,
                growth_score REAL NOT NULL,
                financial_health_score REAL NOT NULL,
                technical_score REAL NOT NULL,
                sentiment_score REAL NOT NULL,
                overall_score REAL NOT NULL,
                recommendation TEXT NOT NULL,
                summary TEXT NOT NULL,
                key_strengths TEXT NOT NULL,
                key_risks TEXT NOT NULL,
                PRIMARY KEY (symbol, date)
            );

            CREATE TABLE IF NOT EXISTS economic_indicators (
                indicator_type TEXT NOT NULL,
                date TEXT NOT NULL,
                value REAL,
                PRIMARY KEY (indicator_type, date)
            );",
        )
        .map_err(|e| AnalysisError::Store(e.to_string()))?;

        debug!("store schema initialized");
        Ok(())
    }

    // ========================================================================
    // Reports
    // ========================================================================

    /// Create a report and return it with its assigned ID.
    ///
    /// # Errors
    /// Returns an error on database failure.
    pub fn create_report(
        &self,
        name: &str,
        report_type: &str,
        description: Option<&str>,
    ) -> Result<Report> {
        let now = Utc::now();
        let conn = self
            .conn
            .lock()
            .map_err(|e| AnalysisError::Store(e.to_string()))?;

        conn.execute(
            "INSERT INTO reports (name, report_type, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![name, report_type, description, now.to_rfc3339(), now.to_rfc3339()],
        )
        .map_err(|e| AnalysisError::Store(e.to_string()))?;

        let id = conn.last_insert_rowid();
        debug!(id, name, "created report");
        Ok(Report {
            id,
            name: name.to_string(),
            report_type: report_type.to_string(),
            description: description.map(str::to_string),
            created_at: now,
            updated_at: now,
        })
    }

    /// Fetch a report by ID.
    ///
    /// # Errors
    /// Returns an error on database failure.
    pub fn get_report(&self, id: i64) -> Result<Option<Report>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| AnalysisError::Store(e.to_string()))?;

        conn.query_row(
            "SELECT id, name, report_type, description, created_at, updated_at
             FROM reports WHERE id = ?1",
            params![id],
            Self::report_from_row,
        )
        .optional()
        .map_err(|e| AnalysisError::Store(e.to_string()))
    }

    /// List all reports, most recently updated first.
    ///
    /// # Errors
    /// Returns an error on database failure.
    pub fn list_reports(&self) -> Result<Vec<Report>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| AnalysisError::Store(e.to_string()))?;

        let mut stmt = conn
            .prepare(
                "SELECT id, name, report_type, description, created_at, updated_at
                 FROM reports ORDER BY updated_at DESC, id DESC",
            )
            .map_err(|e| AnalysisError::Store(e.to_string()))?;

        let rows = stmt
            .query_map([], Self::report_from_row)
            .map_err(|e| AnalysisError::Store(e.to_string()))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| AnalysisError::Store(e.to_string()))
    }

    /// Rename a report, bumping its `updated_at`.
    ///
    /// # Errors
    /// Returns an error if the report does not exist or on database failure.
    pub fn rename_report(&self, id: i64, name: &str) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| AnalysisError::Store(e.to_string()))?;

        let changed = conn
            .execute(
                "UPDATE reports SET name = ?1, updated_at = ?2 WHERE id = ?3",
                params![name, Utc::now().to_rfc3339(), id],
            )
            .map_err(|e| AnalysisError::Store(e.to_string()))?;

        if changed == 0 {
            return Err(AnalysisError::Store(format!("No report with id {}", id)));
        }
        Ok(())
    }

    /// Delete a report and, via cascade, its stock analyses.
    ///
    /// # Errors
    /// Returns an error if the report does not exist or on database failure.
    pub fn delete_report(&self, id: i64) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| AnalysisError::Store(e.to_string()))?;

        let changed = conn
            .execute("DELETE FROM reports WHERE id = ?1", params![id])
            .map_err(|e| AnalysisError::Store(e.to_string()))?;

        if changed == 0 {
            return Err(AnalysisError::Store(format!("No report with id {}", id)));
        }
        debug!(id, "deleted report");
        Ok(())
    }

    fn report_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Report> {
        Ok(Report {
            id: row.get(0)?,
            name: row.get(1)?,
            report_type: row.get(2)?,
            description: row.get(3)?,
            created_at: parse_timestamp(&row.get::<_, String>(4)?),
            updated_at: parse_timestamp(&row.get::<_, String>(5)?),
        })
    }

    // ========================================================================
    // Stock analyses
    // ========================================================================

    /// Attach an analysis result to a report and bump the report's
    /// `updated_at`.
    ///
    /// # Errors
    /// Returns an error if the report does not exist or on database failure.
    pub fn add_stock_analysis(
        &self,
        report_id: i64,
        symbol: &Symbol,
        analysis: &serde_json::Value,
    ) -> Result<StockAnalysis> {
        let now = Utc::now();
        let json =
            serde_json::to_string(analysis).map_err(|e| AnalysisError::Parse(e.to_string()))?;

        let conn = self
            .conn
            .lock()
            .map_err(|e| AnalysisError::Store(e.to_string()))?;

        conn.execute(
            "INSERT INTO stock_analyses (report_id, symbol, analysis_result, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![report_id, symbol.as_str(), json, now.to_rfc3339()],
        )
        .map_err(|e| AnalysisError::Store(e.to_string()))?;
        let id = conn.last_insert_rowid();

        conn.execute(
            "UPDATE reports SET updated_at = ?1 WHERE id = ?2",
            params![now.to_rfc3339(), report_id],
        )
        .map_err(|e| AnalysisError::Store(e.to_string()))?;

        Ok(StockAnalysis {
            id,
            report_id,
            symbol: symbol.clone(),
            analysis: analysis.clone(),
            created_at: now,
        })
    }

    /// List the analyses attached to a report, oldest first.
    ///
    /// # Errors
    /// Returns an error on database failure.
    pub fn list_analyses(&self, report_id: i64) -> Result<Vec<StockAnalysis>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| AnalysisError::Store(e.to_string()))?;

        let mut stmt = conn
            .prepare(
                "SELECT id, report_id, symbol, analysis_result, created_at
                 FROM stock_analyses WHERE report_id = ?1 ORDER BY id ASC",
            )
            .map_err(|e| AnalysisError::Store(e.to_string()))?;

        let rows = stmt
            .query_map(params![report_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .map_err(|e| AnalysisError::Store(e.to_string()))?;

        let mut analyses = Vec::new();
        for row in rows {
            let (id, report_id, symbol, json, created_at) =
                row.map_err(|e| AnalysisError::Store(e.to_string()))?;
            let analysis: serde_json::Value =
                serde_json::from_str(&json).map_err(|e| AnalysisError::Parse(e.to_string()))?;
            analyses.push(StockAnalysis {
                id,
                report_id,
                symbol: Symbol::new(symbol),
                analysis,
                created_at: parse_timestamp(&created_at),
            });
        }
        Ok(analyses)
    }

    // ========================================================================
    // Company profiles
    // ========================================================================

    /// Insert or refresh a company profile.
    ///
    /// # Errors
    /// Returns an error on database failure.
    pub fn upsert_company_profile(&self, profile: &CompanyProfile) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| AnalysisError::Store(e.to_string()))?;

        conn.execute(
            "INSERT INTO company_profiles
             (symbol, name, sector, industry, description, country, website,
              logo_url, employee_count, market_cap, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(symbol) DO UPDATE SET
                name = excluded.name,
                sector = excluded.sector,
                industry = excluded.industry,
                description = excluded.description,
                country = excluded.country,
                website = excluded.website,
                logo_url = excluded.logo_url,
                employee_count = excluded.employee_count,
                market_cap = excluded.market_cap,
                updated_at = excluded.updated_at",
            params![
                profile.symbol.as_str(),
                profile.name,
                profile.sector,
                profile.industry,
                profile.description,
                profile.country,
                profile.website,
                profile.logo_url,
                profile.employee_count,
                profile.market_cap,
                Utc::now().to_rfc3339()
            ],
        )
        .map_err(|e| AnalysisError::Store(e.to_string()))?;
        Ok(())
    }

    /// Fetch a stored company profile.
    ///
    /// # Errors
    /// Returns an error on database failure.
    pub fn get_company_profile(&self, symbol: &Symbol) -> Result<Option<CompanyProfile>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| AnalysisError::Store(e.to_string()))?;

        conn.query_row(
            "SELECT symbol, name, sector, industry, description, country, website,
                    logo_url, employee_count, market_cap
             FROM company_profiles WHERE symbol = ?1",
            params![symbol.as_str()],
            |row| {
                let symbol: String = row.get(0)?;
                let name: String = row.get(1)?;
                let mut profile = CompanyProfile::new(Symbol::new(symbol), name);
                profile.sector = row.get(2)?;
                profile.industry = row.get(3)?;
                profile.description = row.get(4)?;
                profile.country = row.get(5)?;
                profile.website = row.get(6)?;
                profile.logo_url = row.get(7)?;
                profile.employee_count = row.get(8)?;
                profile.market_cap = row.get(9)?;
                Ok(profile)
            },
        )
        .optional()
        .map_err(|e| AnalysisError::Store(e.to_string()))
    }

    // ========================================================================
    // Financial statements
    // ========================================================================

    /// Insert or refresh a financial statement for its fiscal period.
    ///
    /// # Errors
    /// Returns an error on database failure.
    pub fn upsert_financial_statement(&self, record: &StatementRecord) -> Result<()> {
        let json =
            serde_json::to_string(&record.data).map_err(|e| AnalysisError::Parse(e.to_string()))?;

        let conn = self
            .conn
            .lock()
            .map_err(|e| AnalysisError::Store(e.to_string()))?;

        conn.execute(
            "INSERT INTO financial_statements
             (symbol, statement_type, period_type, fiscal_year, fiscal_period,
              filing_date, data_json, source)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(symbol, statement_type, period_type, fiscal_year, fiscal_period)
             DO UPDATE SET
                filing_date = excluded.filing_date,
                data_json = excluded.data_json,
                source = excluded.source",
            params![
                record.symbol.as_str(),
                record.statement_type.as_str(),
                record.period.as_str(),
                record.fiscal_year,
                record.fiscal_period,
                record.filing_date.to_string(),
                json,
                record.source
            ],
        )
        .map_err(|e| AnalysisError::Store(e.to_string()))?;
        Ok(())
    }

    /// List stored statements of one type for a symbol, newest fiscal year
    /// first.
    ///
    /// # Errors
    /// Returns an error on database failure.
    pub fn list_financial_statements(
        &self,
        symbol: &Symbol,
        statement_type: StatementType,
        period: ReportPeriod,
    ) -> Result<Vec<StatementRecord>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| AnalysisError::Store(e.to_string()))?;

        let mut stmt = conn
            .prepare(
                "SELECT fiscal_year, fiscal_period, filing_date, data_json, source
                 FROM financial_statements
                 WHERE symbol = ?1 AND statement_type = ?2 AND period_type = ?3
                 ORDER BY fiscal_year DESC, fiscal_period DESC",
            )
            .map_err(|e| AnalysisError::Store(e.to_string()))?;

        let rows = stmt
            .query_map(
                params![symbol.as_str(), statement_type.as_str(), period.as_str()],
                |row| {
                    Ok((
                        row.get::<_, i32>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .map_err(|e| AnalysisError::Store(e.to_string()))?;

        let mut records = Vec::new();
        for row in rows {
            let (fiscal_year, fiscal_period, filing_date, json, source) =
                row.map_err(|e| AnalysisError::Store(e.to_string()))?;
            let data: serde_json::Value =
                serde_json::from_str(&json).map_err(|e| AnalysisError::Parse(e.to_string()))?;
            records.push(StatementRecord {
                symbol: symbol.clone(),
                statement_type,
                period,
                fiscal_year,
                fiscal_period,
                filing_date: parse_date(&filing_date)?,
                data,
                source,
            });
        }
        Ok(records)
    }

    // ========================================================================
    // Valuation metrics
    // ========================================================================

    /// Insert or refresh a valuation metrics row.
    ///
    /// # Errors
    /// Returns an error on database failure.
    pub fn upsert_valuation_metrics(&self, ratios: &RatioSnapshot) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| AnalysisError::Store(e.to_string()))?;

        conn.execute(
            "INSERT INTO valuation_metrics
             (symbol, date, profit_margin, roe, roa, debt_to_equity, source)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(symbol, date) DO UPDATE SET
                profit_margin = excluded.profit_margin,
                roe = excluded.roe,
                roa = excluded.roa,
                debt_to_equity = excluded.debt_to_equity,
                source = excluded.source",
            params![
                ratios.symbol.as_str(),
                ratios.date.to_string(),
                ratios.profit_margin,
                ratios.roe,
                ratios.roa,
                ratios.debt_to_equity,
                ratios.source
            ],
        )
        .map_err(|e| AnalysisError::Store(e.to_string()))?;
        Ok(())
    }

    /// Fetch the most recent valuation metrics for a symbol.
    ///
    /// # Errors
    /// Returns an error on database failure.
    pub fn latest_valuation_metrics(&self, symbol: &Symbol) -> Result<Option<RatioSnapshot>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| AnalysisError::Store(e.to_string()))?;

        let row = conn
            .query_row(
                "SELECT date, profit_margin, roe, roa, debt_to_equity, source
                 FROM valuation_metrics WHERE symbol = ?1
                 ORDER BY date DESC LIMIT 1",
                params![symbol.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<f64>>(1)?,
                        row.get::<_, Option<f64>>(2)?,
                        row.get::<_, Option<f64>>(3)?,
                        row.get::<_, Option<f64>>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                },
            )
            .optional()
            .map_err(|e| AnalysisError::Store(e.to_string()))?;

        match row {
            Some((date, profit_margin, roe, roa, debt_to_equity, source)) => {
                let mut ratios = RatioSnapshot::new(symbol.clone(), parse_date(&date)?, source);
                ratios.profit_margin = profit_margin;
                ratios.roe = roe;
                ratios.roa = roa;
                ratios.debt_to_equity = debt_to_equity;
                Ok(Some(ratios))
            }
            None => Ok(None),
        }
    }

    // ========================================================================
    // Technical indicators and scores
    // ========================================================================

    /// Insert or refresh a technical indicator snapshot for its date.
    ///
    /// # Errors
    /// Returns an error on database failure.
    pub fn upsert_technical_indicators(
        &self,
        symbol: &Symbol,
        snapshot: &IndicatorSnapshot,
    ) -> Result<()> {
        let json =
            serde_json::to_string(snapshot).map_err(|e| AnalysisError::Parse(e.to_string()))?;

        let conn = self
            .conn
            .lock()
            .map_err(|e| AnalysisError::Store(e.to_string()))?;

        conn.execute(
            "INSERT INTO technical_indicators (symbol, date, data_json)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(symbol, date) DO UPDATE SET data_json = excluded.data_json",
            params![symbol.as_str(), snapshot.date.to_string(), json],
        )
        .map_err(|e| AnalysisError::Store(e.to_string()))?;
        Ok(())
    }

    /// Fetch the most recent stored indicator snapshot for a symbol.
    ///
    /// # Errors
    /// Returns an error on database failure.
    pub fn latest_technical_indicators(
        &self,
        symbol: &Symbol,
    ) -> Result<Option<IndicatorSnapshot>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| AnalysisError::Store(e.to_string()))?;

        let json = conn
            .query_row(
                "SELECT data_json FROM technical_indicators
                 WHERE symbol = ?1 ORDER BY date DESC LIMIT 1",
                params![symbol.as_str()],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(|e| AnalysisError::Store(e.to_string()))?;

        match json {
            Some(json) => {
                let snapshot =
                    serde_json::from_str(&json).map_err(|e| AnalysisError::Parse(e.to_string()))?;
                Ok(Some(snapshot))
            }
            None => Ok(None),
        }
    }

    /// Insert or refresh an investment score for its date.
    ///
    /// # Errors
    /// Returns an error on database failure.
    pub fn upsert_investment_score(&self, score: &ScoreBreakdown) -> Result<()> {
        let strengths = serde_json::to_string(&score.key_strengths)
            .map_err(|e| AnalysisError::Parse(e.to_string()))?;
        let risks = serde_json::to_string(&score.key_risks)
            .map_err(|e| AnalysisError::Parse(e.to_string()))?;

        let conn = self
            .conn
            .lock()
            .map_err(|e| AnalysisError::Store(e.to_string()))?;

        conn.execute(
            "INSERT INTO investment_scores
             (symbol, date, valuation_score, growth_score, financial_health_score,
              technical_score, sentiment_score, overall_score, recommendation,
              summary, key_strengths, key_risks)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
             ON CONFLICT(symbol, date) DO UPDATE SET
                valuation_score = excluded.valuation_score,
                growth_score = excluded.growth_score,
                financial_health_score = excluded.financial_health_score,
                technical_score = excluded.technical_score,
                sentiment_score = excluded.sentiment_score,
                overall_score = excluded.overall_score,
                recommendation = excluded.recommendation,
                summary = excluded.summary,
                key_strengths = excluded.key_strengths,
                key_risks = excluded.key_risks",
            params![
                score.symbol.as_str(),
                score.date.to_string(),
                score.valuation_score,
                score.growth_score,
                score.financial_health_score,
                score.technical_score,
                score.sentiment_score,
                score.overall_score,
                score.recommendation.as_str(),
                score.summary,
                strengths,
                risks
            ],
        )
        .map_err(|e| AnalysisError::Store(e.to_string()))?;
        Ok(())
    }

    /// Fetch the most recent investment score for a symbol.
    ///
    /// # Errors
    /// Returns an error on database failure.
    pub fn latest_investment_score(&self, symbol: &Symbol) -> Result<Option<ScoreBreakdown>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| AnalysisError::Store(e.to_string()))?;

        let row = conn
            .query_row(
                "SELECT date, valuation_score, growth_score, financial_health_score,
                        technical_score, sentiment_score, overall_score, summary,
                        key_strengths, key_risks
                 FROM investment_scores WHERE symbol = ?1
                 ORDER BY date DESC LIMIT 1",
                params![symbol.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, f64>(1)?,
                        row.get::<_, f64>(2)?,
                        row.get::<_, f64>(3)?,
                        row.get::<_, f64>(4)?,
                        row.get::<_, f64>(5)?,
                        row.get::<_, f64>(6)?,
                        row.get::<_, String>(7)?,
                        row.get::<_, String>(8)?,
                        row.get::<_, String>(9)?,
                    ))
                },
            )
            .optional()
            .map_err(|e| AnalysisError::Store(e.to_string()))?;

        match row {
            Some((
                date,
                valuation_score,
                growth_score,
                financial_health_score,
                technical_score,
                sentiment_score,
                overall_score,
                summary,
                strengths,
                risks,
            )) => {
                let key_strengths: Vec<String> = serde_json::from_str(&strengths)
                    .map_err(|e| AnalysisError::Parse(e.to_string()))?;
                let key_risks: Vec<String> =
                    serde_json::from_str(&risks).map_err(|e| AnalysisError::Parse(e.to_string()))?;
                Ok(Some(ScoreBreakdown {
                    symbol: symbol.clone(),
                    date: parse_date(&date)?,
                    valuation_score,
                    growth_score,
                    financial_health_score,
                    technical_score,
                    sentiment_score,
                    overall_score,
                    recommendation: Recommendation::from_score(overall_score),
                    summary,
                    key_strengths,
                    key_risks,
                }))
            }
            None => Ok(None),
        }
    }

    // ========================================================================
    // Economic indicators
    // ========================================================================

    /// Insert or refresh one economic observation.
    ///
    /// # Errors
    /// Returns an error on database failure.
    pub fn upsert_economic_point(
        &self,
        kind: EconomicIndicatorKind,
        point: EconomicPoint,
    ) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| AnalysisError::Store(e.to_string()))?;

        conn.execute(
            "INSERT INTO economic_indicators (indicator_type, date, value)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(indicator_type, date) DO UPDATE SET value = excluded.value",
            params![kind.as_str(), point.date.to_string(), point.value],
        )
        .map_err(|e| AnalysisError::Store(e.to_string()))?;
        Ok(())
    }

    /// Fetch the most recent stored observation for an indicator.
    ///
    /// # Errors
    /// Returns an error on database failure.
    pub fn latest_economic(&self, kind: EconomicIndicatorKind) -> Result<Option<EconomicPoint>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| AnalysisError::Store(e.to_string()))?;

        let row = conn
            .query_row(
                "SELECT date, value FROM economic_indicators
                 WHERE indicator_type = ?1 ORDER BY date DESC LIMIT 1",
                params![kind.as_str()],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, Option<f64>>(1)?)),
            )
            .optional()
            .map_err(|e| AnalysisError::Store(e.to_string()))?;

        match row {
            Some((date, value)) => Ok(Some(EconomicPoint {
                date: parse_date(&date)?,
                value,
            })),
            None => Ok(None),
        }
    }

    /// Fetch the stored history for an indicator, oldest first.
    ///
    /// # Errors
    /// Returns an error on database failure.
    pub fn economic_history(&self, kind: EconomicIndicatorKind) -> Result<Vec<EconomicPoint>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| AnalysisError::Store(e.to_string()))?;

        let mut stmt = conn
            .prepare(
                "SELECT date, value FROM economic_indicators
                 WHERE indicator_type = ?1 ORDER BY date ASC",
            )
            .map_err(|e| AnalysisError::Store(e.to_string()))?;

        let rows = stmt
            .query_map(params![kind.as_str()], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Option<f64>>(1)?))
            })
            .map_err(|e| AnalysisError::Store(e.to_string()))?;

        let mut points = Vec::new();
        for row in rows {
            let (date, value) = row.map_err(|e| AnalysisError::Store(e.to_string()))?;
            points.push(EconomicPoint {
                date: parse_date(&date)?,
                value,
            });
        }
        Ok(points)
    }
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| AnalysisError::Parse(format!("Invalid stored date {}: {}", s, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn report_crud_roundtrip() {
        let store = AnalysisStore::in_memory().unwrap();

        let report = store
            .create_report("Tech watchlist", "watchlist", Some("FAANG and friends"))
            .unwrap();
        assert!(report.id > 0);

        let fetched = store.get_report(report.id).unwrap().unwrap();
        assert_eq!(fetched.name, "Tech watchlist");
        assert_eq!(fetched.report_type, "watchlist");

        store.rename_report(report.id, "Megacap watchlist").unwrap();
        let renamed = store.get_report(report.id).unwrap().unwrap();
        assert_eq!(renamed.name, "Megacap watchlist");

        assert_eq!(store.list_reports().unwrap().len(), 1);

        store.delete_report(report.id).unwrap();
        assert!(store.get_report(report.id).unwrap().is_none());
    }

    #[test]
    fn rename_missing_report_fails() {
        let store = AnalysisStore::in_memory().unwrap();
        assert!(store.rename_report(42, "nope").is_err());
        assert!(store.delete_report(42).is_err());
    }

    #[test]
    fn deleting_report_cascades_to_analyses() {
        let store = AnalysisStore::in_memory().unwrap();
        let report = store.create_report("r", "watchlist", None).unwrap();
        let symbol = Symbol::new("AAPL");

        store
            .add_stock_analysis(report.id, &symbol, &json!({"score": 72.5}))
            .unwrap();
        assert_eq!(store.list_analyses(report.id).unwrap().len(), 1);

        store.delete_report(report.id).unwrap();
        assert!(store.list_analyses(report.id).unwrap().is_empty());
    }

    #[test]
    fn analysis_json_roundtrip() {
        let store = AnalysisStore::in_memory().unwrap();
        let report = store.create_report("r", "deep_dive", None).unwrap();
        let symbol = Symbol::new("MSFT");
        let payload = json!({"profile": {"name": "Microsoft"}, "score": 81.0});

        store
            .add_stock_analysis(report.id, &symbol, &payload)
            .unwrap();

        let analyses = store.list_analyses(report.id).unwrap();
        assert_eq!(analyses.len(), 1);
        assert_eq!(analyses[0].symbol, symbol);
        assert_eq!(analyses[0].analysis, payload);
    }

    #[test]
    fn profile_upsert_is_idempotent() {
        let store = AnalysisStore::in_memory().unwrap();
        let symbol = Symbol::new("AAPL");

        let mut profile = CompanyProfile::new(symbol.clone(), "Apple Inc.");
        profile.sector = Some("Technology".to_string());
        store.upsert_company_profile(&profile).unwrap();

        profile.market_cap = Some(3.0e12);
        store.upsert_company_profile(&profile).unwrap();

        let fetched = store.get_company_profile(&symbol).unwrap().unwrap();
        assert_eq!(fetched.name, "Apple Inc.");
        assert_eq!(fetched.sector.as_deref(), Some("Technology"));
        assert_eq!(fetched.market_cap, Some(3.0e12));
    }

    #[test]
    fn statement_upsert_replaces_same_period() {
        let store = AnalysisStore::in_memory().unwrap();
        let symbol = Symbol::new("AAPL");

        let mut record = StatementRecord {
            symbol: symbol.clone(),
            statement_type: StatementType::Income,
            period: ReportPeriod::Annual,
            fiscal_year: 2023,
            fiscal_period: "FY".to_string(),
            filing_date: date(2023, 11, 3),
            data: json!({"revenue": 383_285_000_000.0}),
            source: "SEC EDGAR".to_string(),
        };
        store.upsert_financial_statement(&record).unwrap();

        record.data = json!({"revenue": 383_286_000_000.0});
        store.upsert_financial_statement(&record).unwrap();

        let records = store
            .list_financial_statements(&symbol, StatementType::Income, ReportPeriod::Annual)
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].data["revenue"], json!(383_286_000_000.0));
    }

    #[test]
    fn valuation_metrics_latest_by_date() {
        let store = AnalysisStore::in_memory().unwrap();
        let symbol = Symbol::new("AAPL");

        let mut older = RatioSnapshot::new(symbol.clone(), date(2023, 9, 30), "SEC EDGAR");
        older.roe = Some(1.56);
        store.upsert_valuation_metrics(&older).unwrap();

        let mut newer = RatioSnapshot::new(symbol.clone(), date(2024, 9, 28), "SEC EDGAR");
        newer.roe = Some(1.61);
        store.upsert_valuation_metrics(&newer).unwrap();

        let latest = store.latest_valuation_metrics(&symbol).unwrap().unwrap();
        assert_eq!(latest.date, date(2024, 9, 28));
        assert_eq!(latest.roe, Some(1.61));
    }

    #[test]
    fn indicator_snapshot_roundtrip() {
        let store = AnalysisStore::in_memory().unwrap();
        let symbol = Symbol::new("AAPL");

        let snapshot = IndicatorSnapshot {
            date: date(2024, 6, 28),
            close: 210.0,
            volume: 50_000_000.0,
            rsi_14: Some(55.2),
            ..Default::default()
        };
        store.upsert_technical_indicators(&symbol, &snapshot).unwrap();

        let fetched = store.latest_technical_indicators(&symbol).unwrap().unwrap();
        assert_eq!(fetched.date, snapshot.date);
        assert_eq!(fetched.rsi_14, Some(55.2));
    }

    #[test]
    fn score_roundtrip_keeps_recommendation_band() {
        let store = AnalysisStore::in_memory().unwrap();
        let symbol = Symbol::new("AAPL");

        let score = ScoreBreakdown {
            symbol: symbol.clone(),
            date: date(2024, 6, 28),
            valuation_score: 85.0,
            growth_score: 50.0,
            financial_health_score: 80.0,
            technical_score: 70.0,
            sentiment_score: 50.0,
            overall_score: 81.0,
            recommendation: Recommendation::StrongBuy,
            summary: "AAPL scores 81.0/100 (strong_buy)".to_string(),
            key_strengths: vec!["Strong valuation (85/100)".to_string()],
            key_risks: vec![],
        };
        store.upsert_investment_score(&score).unwrap();

        let fetched = store.latest_investment_score(&symbol).unwrap().unwrap();
        assert_eq!(fetched.recommendation, Recommendation::StrongBuy);
        assert_eq!(fetched.key_strengths.len(), 1);
        assert!(fetched.key_risks.is_empty());
    }

    #[test]
    fn economic_history_ordered_and_upserted() {
        let store = AnalysisStore::in_memory().unwrap();
        let kind = EconomicIndicatorKind::InterestRate;

        store
            .upsert_economic_point(
                kind,
                EconomicPoint {
                    date: date(2024, 5, 1),
                    value: Some(5.33),
                },
            )
            .unwrap();
        store
            .upsert_economic_point(
                kind,
                EconomicPoint {
                    date: date(2024, 6, 1),
                    value: Some(5.33),
                },
            )
            .unwrap();
        // Overwrite the June value.
        store
            .upsert_economic_point(
                kind,
                EconomicPoint {
                    date: date(2024, 6, 1),
                    value: Some(5.25),
                },
            )
            .unwrap();

        let history = store.economic_history(kind).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].date, date(2024, 5, 1));

        let latest = store.latest_economic(kind).unwrap().unwrap();
        assert_eq!(latest.date, date(2024, 6, 1));
        assert_eq!(latest.value, Some(5.25));

        assert!(
            store
                .latest_economic(EconomicIndicatorKind::Gdp)
                .unwrap()
                .is_none()
        );
    }
}

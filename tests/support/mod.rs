//! In-memory stand-ins for an Oracle session, scripted per test.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use oracle_agent_plugin::oracle::connection::{ColumnMeta, Connector, QueryRows, Session};
use oracle_agent_plugin::oracle::models::{ConnectionConfig, Credentials};
use oracle_agent_plugin::oracle::{PluginError, Result};
use oracle_agent_plugin::plugin::Configuration;

pub fn configuration() -> Configuration {
    Configuration::new()
        .with("host", "db.example.com")
        .with("port", "1521")
        .with("sid", "ORCL")
        .with("driverClass", "oracle.jdbc.driver.OracleDriver")
        .with("principal", "monitor")
        .with("credentials", "secret")
}

pub fn rows(columns: &[(&str, &str)], data: &[&[Option<&str>]]) -> QueryRows {
    QueryRows {
        columns: columns.iter().map(|(name, ty)| ColumnMeta::new(*name, *ty)).collect(),
        rows: data
            .iter()
            .map(|row| row.iter().map(|v| v.map(str::to_string)).collect())
            .collect(),
    }
}

/// A single-value result, as returned by `COUNT(*)` or `SUM(...)`
pub fn scalar(value: Option<&str>) -> QueryRows {
    rows(&[("VALUE", "NUMBER")], &[&[value]])
}

#[derive(Debug, Clone)]
pub enum Reply {
    Rows(QueryRows),
    Updated(u64),
    Fail(String),
}

/// Replies keyed by a fragment of the SQL text; the first matching entry wins.
#[derive(Debug, Clone, Default)]
pub struct Script {
    entries: Vec<(String, Reply)>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, fragment: &str, reply: Reply) -> Self {
        self.entries.push((fragment.to_string(), reply));
        self
    }

    fn reply_for(&self, sql: &str) -> Option<&Reply> {
        self.entries
            .iter()
            .find(|(fragment, _)| sql.contains(fragment.as_str()))
            .map(|(_, reply)| reply)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Executed {
    pub sql: String,
    pub params: Vec<String>,
}

#[derive(Debug)]
pub struct FakeSession {
    script: Script,
    closed: AtomicBool,
    fail_close: bool,
    executed: Mutex<Vec<Executed>>,
}

impl FakeSession {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            closed: AtomicBool::new(false),
            fail_close: false,
            executed: Mutex::new(Vec::new()),
        }
    }

    pub fn mark_closed(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn executed(&self) -> Vec<Executed> {
        self.executed.lock().unwrap().clone()
    }

    /// Number of statements whose text contains `fragment`
    pub fn count(&self, fragment: &str) -> usize {
        self.executed().iter().filter(|e| e.sql.contains(fragment)).count()
    }

    fn record(&self, sql: &str, params: &[&str]) {
        self.executed.lock().unwrap().push(Executed {
            sql: sql.to_string(),
            params: params.iter().map(|p| p.to_string()).collect(),
        });
    }
}

impl Session for FakeSession {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn query(&self, sql: &str, params: &[&str]) -> Result<QueryRows> {
        self.record(sql, params);
        match self.script.reply_for(sql) {
            Some(Reply::Rows(rows)) => Ok(rows.clone()),
            Some(Reply::Fail(message)) => Err(PluginError::query(message.clone())),
            Some(Reply::Updated(_)) | None => Ok(QueryRows::default()),
        }
    }

    fn execute(&self, sql: &str, params: &[&str]) -> Result<u64> {
        self.record(sql, params);
        match self.script.reply_for(sql) {
            Some(Reply::Updated(count)) => Ok(*count),
            Some(Reply::Fail(message)) => Err(PluginError::query(message.clone())),
            Some(Reply::Rows(_)) | None => Ok(0),
        }
    }

    fn close(&self) -> Result<()> {
        self.mark_closed();
        if self.fail_close {
            Err(PluginError::query("ORA-03113: end-of-file on communication channel"))
        } else {
            Ok(())
        }
    }
}

/// Hands out a fresh [`FakeSession`] per connect, all following one script.
#[derive(Debug, Default)]
pub struct FakeConnector {
    script: Script,
    fail: AtomicBool,
    fail_close: bool,
    connects: AtomicUsize,
    sessions: Mutex<Vec<Arc<FakeSession>>>,
    logins: Mutex<Vec<Credentials>>,
}

impl FakeConnector {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            ..Self::default()
        })
    }

    pub fn failing_close(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            fail_close: true,
            ..Self::default()
        })
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn last_session(&self) -> Arc<FakeSession> {
        Arc::clone(self.sessions.lock().unwrap().last().expect("no session opened"))
    }

    pub fn last_login(&self) -> Credentials {
        self.logins.lock().unwrap().last().cloned().expect("no login attempted")
    }
}

impl Connector for FakeConnector {
    fn connect(&self, config: &ConnectionConfig, credentials: &Credentials) -> Result<Arc<dyn Session>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.logins.lock().unwrap().push(credentials.clone());
        if self.fail.load(Ordering::SeqCst) {
            return Err(PluginError::connection(format!(
                "Could not connect to database at {}: ORA-12541: TNS:no listener",
                config.jdbc_url()
            )));
        }

        let mut session = FakeSession::new(self.script.clone());
        session.fail_close = self.fail_close;
        let session = Arc::new(session);
        self.sessions.lock().unwrap().push(Arc::clone(&session));
        let session: Arc<dyn Session> = session;
        Ok(session)
    }
}

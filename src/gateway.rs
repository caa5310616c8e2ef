// =====================================================
// GATEWAY
// Identity check, identifier validation and one session per call
// =====================================================

use crate::config::GatewayConfig;
use crate::db::data_transfer::{self, ExportLimits};
use crate::db::executor::{Connector, GatewayExecutor, Statement};
use crate::db::identifier::TableRef;
use crate::db::rows::PageLimits;
use crate::db::{metadata, mutation, query_execution, rows};
use crate::db_types::{
    CallerIdentity, ConnectionProfile, ExportPayload, ExportRequest, ImportReport, ImportRequest,
    InsertOutcome, ListRowsRequest, MutationOutcome, PrimaryKeyValue, QueryRows, Record, RowPage,
    TableMeta, TableSchema, TableSummary,
};
use crate::error::{GatewayError, GatewayResult};
use crate::mysql::MySqlConnector;

/// Entry point for every table operation.
///
/// Each call checks that the caller owns the connection profile, validates
/// the table identifier, opens a fresh session through the connector, runs
/// its statements in order and closes the session whether they succeeded or
/// not. Nothing is cached between calls.
pub struct Gateway<C: Connector> {
    connector: C,
    config: GatewayConfig,
}

impl Gateway<MySqlConnector> {
    pub fn mysql(config: GatewayConfig) -> Self {
        Self::with_config(MySqlConnector::new(config.clone()), config)
    }
}

impl<C: Connector> Gateway<C> {
    pub fn new(connector: C) -> Self {
        Self::with_config(connector, GatewayConfig::default())
    }

    pub fn with_config(connector: C, config: GatewayConfig) -> Self {
        Self { connector, config }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    // --- Boundary checks ---

    fn authorize(
        &self,
        identity: Option<&CallerIdentity>,
        profile: &ConnectionProfile,
    ) -> GatewayResult<()> {
        let caller = identity
            .ok_or_else(|| GatewayError::Unauthorized("Not authenticated".to_string()))?;
        if caller.user_id != profile.owner_id {
            log::warn!(
                "Caller {} denied access to connection {}",
                caller.user_id,
                profile.id
            );
            return Err(GatewayError::Unauthorized(
                "Connection does not belong to the caller".to_string(),
            ));
        }
        Ok(())
    }

    fn authorize_table(
        &self,
        identity: Option<&CallerIdentity>,
        profile: &ConnectionProfile,
        table_id: &str,
    ) -> GatewayResult<TableRef> {
        self.authorize(identity, profile)?;
        TableRef::parse(table_id)
    }

    async fn open(&self, profile: &ConnectionProfile) -> GatewayResult<C::Session> {
        self.connector.open(profile).await
    }

    // --- Row browsing ---

    pub async fn list_rows(
        &self,
        identity: Option<&CallerIdentity>,
        profile: &ConnectionProfile,
        table_id: &str,
        request: &ListRowsRequest,
    ) -> GatewayResult<RowPage> {
        let table = self.authorize_table(identity, profile, table_id)?;
        let limits = PageLimits::from(&self.config);
        let mut session = self.open(profile).await?;
        let result = rows::list_rows(&mut session, &table, request, &limits).await;
        session.close().await;
        result
    }

    // --- Bulk transfer ---

    pub async fn export_table(
        &self,
        identity: Option<&CallerIdentity>,
        profile: &ConnectionProfile,
        table_id: &str,
        request: &ExportRequest,
    ) -> GatewayResult<ExportPayload> {
        let table = self.authorize_table(identity, profile, table_id)?;
        let limits = ExportLimits::from(&self.config);
        let mut session = self.open(profile).await?;
        let result = data_transfer::export_table(&mut session, &table, request, &limits).await;
        session.close().await;
        result
    }

    pub async fn import_table(
        &self,
        identity: Option<&CallerIdentity>,
        profile: &ConnectionProfile,
        table_id: &str,
        request: &ImportRequest,
    ) -> GatewayResult<ImportReport> {
        let table = self.authorize_table(identity, profile, table_id)?;
        let mut session = self.open(profile).await?;
        let result = data_transfer::import_table(&mut session, &table, request).await;
        session.close().await;
        result
    }

    // --- Row mutation ---

    pub async fn insert_row(
        &self,
        identity: Option<&CallerIdentity>,
        profile: &ConnectionProfile,
        table_id: &str,
        data: &Record,
    ) -> GatewayResult<InsertOutcome> {
        let table = self.authorize_table(identity, profile, table_id)?;
        let mut session = self.open(profile).await?;
        let result = mutation::insert_row(&mut session, &table, data).await;
        session.close().await;
        result
    }

    pub async fn update_row(
        &self,
        identity: Option<&CallerIdentity>,
        profile: &ConnectionProfile,
        table_id: &str,
        pk: &PrimaryKeyValue,
        data: &Record,
    ) -> GatewayResult<MutationOutcome> {
        let table = self.authorize_table(identity, profile, table_id)?;
        let mut session = self.open(profile).await?;
        let result = mutation::update_row(&mut session, &table, pk, data).await;
        session.close().await;
        result
    }

    pub async fn delete_row(
        &self,
        identity: Option<&CallerIdentity>,
        profile: &ConnectionProfile,
        table_id: &str,
        pk: &PrimaryKeyValue,
    ) -> GatewayResult<MutationOutcome> {
        let table = self.authorize_table(identity, profile, table_id)?;
        let mut session = self.open(profile).await?;
        let result = mutation::delete_row(&mut session, &table, pk).await;
        session.close().await;
        result
    }

    /// Inserts a copy of `row`, applying `overrides` on top.
    pub async fn duplicate_row(
        &self,
        identity: Option<&CallerIdentity>,
        profile: &ConnectionProfile,
        table_id: &str,
        row: &Record,
        overrides: &Record,
    ) -> GatewayResult<InsertOutcome> {
        let table = self.authorize_table(identity, profile, table_id)?;
        let mut session = self.open(profile).await?;
        let result = mutation::duplicate_row(&mut session, &table, row, overrides).await;
        session.close().await;
        result
    }

    // --- Schema introspection ---

    pub async fn describe_table(
        &self,
        identity: Option<&CallerIdentity>,
        profile: &ConnectionProfile,
        table_id: &str,
    ) -> GatewayResult<TableMeta> {
        let table = self.authorize_table(identity, profile, table_id)?;
        let mut session = self.open(profile).await?;
        let result = metadata::describe_table(&mut session, &table).await;
        session.close().await;
        result
    }

    pub async fn table_schema(
        &self,
        identity: Option<&CallerIdentity>,
        profile: &ConnectionProfile,
        table_id: &str,
    ) -> GatewayResult<TableSchema> {
        let table = self.authorize_table(identity, profile, table_id)?;
        let mut session = self.open(profile).await?;
        let result = metadata::table_schema(&mut session, &table).await;
        session.close().await;
        result
    }

    /// Tables and views of the profile's database, or of every user schema
    /// when the profile names none.
    pub async fn list_tables(
        &self,
        identity: Option<&CallerIdentity>,
        profile: &ConnectionProfile,
    ) -> GatewayResult<Vec<TableSummary>> {
        self.authorize(identity, profile)?;
        let mut session = self.open(profile).await?;
        let result = metadata::list_tables(&mut session, profile.database.as_deref()).await;
        session.close().await;
        result
    }

    // --- Ad-hoc queries ---

    pub async fn run_query(
        &self,
        identity: Option<&CallerIdentity>,
        profile: &ConnectionProfile,
        sql: &str,
    ) -> GatewayResult<QueryRows> {
        self.authorize(identity, profile)?;
        query_execution::validate_sql(sql)?;
        let mut session = self.open(profile).await?;
        let result = query_execution::run_query(&mut session, sql, self.config.query_row_cap).await;
        session.close().await;
        result
    }

    pub async fn test_connection(
        &self,
        identity: Option<&CallerIdentity>,
        profile: &ConnectionProfile,
    ) -> GatewayResult<String> {
        self.authorize(identity, profile)?;
        let mut session = self.open(profile).await?;
        let result = session.fetch_all(&Statement::new("SELECT 1")).await;
        session.close().await;
        result?;
        Ok("MySQL connection successful! Handshake verified.".to_string())
    }
}

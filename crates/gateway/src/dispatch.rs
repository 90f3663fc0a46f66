// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The request dispatcher: one instance per engine session.
//!
//! Owns the session state — remote client, configuration, caches, the
//! translated segment filter — and implements every protocol operation.
//! Domain failures are converted to ERROR responses at this boundary;
//! the connection loop never sees them.

use std::path::PathBuf;

use jg_core::fields::{
    EMPTY_SELECT_OPTION, FIELD_AFFECTSVERSIONS, FIELD_ASSIGNEE, FIELD_COMMENTS, FIELD_COMPONENTS,
    FIELD_DESCRIPTION, FIELD_DUEDATE, FIELD_ENVIRONMENT, FIELD_FIX, FIELD_FIXVERSIONS,
    FIELD_ISSUETYPE, FIELD_KEY, FIELD_PRIORITY, FIELD_REPORTER, FIELD_RESOLUTION, FIELD_STATUS,
    FIELD_STATUS_RESOLUTION, FIELD_SUMMARY, FIELD_UPDATED, PROJECT_ALL, PROJECT_FIELD,
    PROJECT_SEPARATOR,
};
use jg_core::fields::{Access, FieldType};
use jg_core::{dates, Config, FieldMap};
use jg_wire::{Desc, Request, RequestKind, Response};

use crate::cache::SessionCaches;
use crate::error::{GatewayError, Result};
use crate::filter::{translate_filter, FilterTables, JqlBuilder};
use crate::jira::http::HttpJira;
use crate::jira::{
    Issue, JiraApi, JiraError, JiraResult, NamedId, TransitionInput, TransitionOption,
};
use crate::mapping;
use crate::search::{run_paged_query, DEFAULT_QUERY_LIMIT};

/// Oldest supported server generation; JIRA 5 build numbers start here.
const MIN_SUPPORTED_BUILD: u64 = 700;

/// Opens the remote connection during LOGIN. The trait exists so tests
/// can hand the dispatcher a scripted remote instead of a live server.
pub trait Connector: Send {
    fn connect(
        &self,
        url: &str,
        username: &str,
        password: &str,
        config: &Config,
    ) -> JiraResult<Box<dyn JiraApi>>;
}

/// Production connector building the blocking REST client.
pub struct HttpConnector;

impl Connector for HttpConnector {
    fn connect(
        &self,
        url: &str,
        username: &str,
        password: &str,
        config: &Config,
    ) -> JiraResult<Box<dyn JiraApi>> {
        let client = HttpJira::new(
            url,
            username,
            password,
            config.request_timeout(),
            config.connection_timeout(),
        )?;
        Ok(Box::new(client))
    }
}

/// Dispatcher construction options.
#[derive(Debug, Clone)]
pub struct DispatcherOptions {
    /// Path of the gateway configuration file, loaded at LOGIN.
    pub config_path: PathBuf,
    /// Search page size; the effective page is capped by the request's
    /// MAX attribute.
    pub batch_size: u32,
}

/// Per-session state established by LOGIN.
struct Session {
    api: Box<dyn JiraApi>,
    config: Config,
    caches: SessionCaches,
    username: String,
    server_version: String,
    segment_filter: Option<String>,
    project_list: Option<String>,
}

/// The session-scoped request dispatcher.
pub struct Dispatcher {
    options: DispatcherOptions,
    connector: Box<dyn Connector>,
    session: Option<Session>,
}

impl Dispatcher {
    pub fn new(options: DispatcherOptions, connector: Box<dyn Connector>) -> Self {
        Dispatcher {
            options,
            connector,
            session: None,
        }
    }

    /// Dispatcher wired to the live REST connector.
    pub fn with_http(options: DispatcherOptions) -> Self {
        Dispatcher::new(options, Box::new(HttpConnector))
    }

    /// Handle one request, producing exactly one response. Domain errors
    /// become ERROR responses here.
    pub fn handle(&mut self, request: &Request) -> Response {
        let Some(kind) = request.kind() else {
            return Response::error(format!(
                "Unknown element name in request: {}",
                request.tag()
            ));
        };
        let result = match kind {
            RequestKind::Shutdown => Ok(Response::string("CLOSING")),
            RequestKind::Connect => Ok(Response::string("connected")),
            RequestKind::Ping => Ok(Response::string("PONG")),
            RequestKind::GetServerVersion => Ok(Response::string("1.0")),
            RequestKind::ReferencedFields => Ok(Response::string("OK")),
            RequestKind::Login => self.login(request),
            RequestKind::GetServerDate => self.get_server_date(),
            RequestKind::ListProjects => self.list_projects(),
            RequestKind::GetProject => self.get_project(request),
            RequestKind::ListFields => self.list_fields(request),
            RequestKind::ListDefects => self.list_defects(request),
            RequestKind::SegmentFilters => self.segment_filters(request),
            RequestKind::CreateDefect => self.create_defect(request),
            RequestKind::NewDefect => self.new_defect(request),
            RequestKind::SaveDefect => self.save_defect(request),
            RequestKind::GetDefect => self.get_defect(request),
        };
        match result {
            Ok(response) => response,
            Err(error) => {
                tracing::error!("{}: {}", kind, error);
                error.to_response()
            }
        }
    }

    fn session(&self) -> Result<&Session> {
        self.session.as_ref().ok_or(GatewayError::NotLoggedIn)
    }

    fn session_mut(&mut self) -> Result<&mut Session> {
        self.session.as_mut().ok_or(GatewayError::NotLoggedIn)
    }

    // ── LOGIN ────────────────────────────────────────────────────────────

    fn login(&mut self, request: &Request) -> Result<Response> {
        let url = request
            .attr_non_empty("JIRA_URL")
            .ok_or(GatewayError::MissingAttribute("login", "JIRA_URL"))?;
        let username = request
            .attr("JIRA_USER")
            .ok_or(GatewayError::MissingAttribute("login", "JIRA_USER"))?;
        let password = request
            .attr_non_empty("JIRA_PASSWORD")
            .ok_or(GatewayError::MissingAttribute("login", "JIRA_PASSWORD"))?;

        let config = Config::load(&self.options.config_path)
            .map_err(|e| GatewayError::Login(e.to_string()))?;

        let api = self
            .connector
            .connect(url, username, password, &config)
            .map_err(|e| GatewayError::Login(e.to_string()))?;

        let info = api
            .server_info()
            .map_err(|e| GatewayError::Login(e.to_string()))?;
        if info.build_number < MIN_SUPPORTED_BUILD {
            return Err(GatewayError::Login(
                "this gateway only supports JIRA server version 5 or greater.".to_string(),
            ));
        }

        if config.ignore_projects().is_empty() {
            tracing::info!("ignored projects: none");
        } else {
            tracing::info!("ignored projects: {}", config.ignore_projects().join(","));
        }
        if config.query_legacy() {
            tracing::info!("using legacy query style");
        }
        tracing::info!(
            "logged in to {} (server version {}, batch size {})",
            url,
            info.version,
            self.options.batch_size
        );

        let caches = SessionCaches::new(config.project_refresh_count());
        self.session = Some(Session {
            api,
            config,
            caches,
            username: username.to_string(),
            server_version: info.version.clone(),
            segment_filter: None,
            project_list: None,
        });
        Ok(Response::string(info.version))
    }

    // ── Trivial server queries ───────────────────────────────────────────

    fn get_server_date(&self) -> Result<Response> {
        let session = self.session()?;
        let info = session.api.server_info().map_err(|e| {
            GatewayError::remote("getting the JIRA server date time", e)
        })?;
        let time = info.server_time.ok_or_else(|| {
            GatewayError::remote(
                "getting the JIRA server date time",
                "server time not included in server info",
            )
        })?;
        Ok(Response::string(dates::format_wire(time)))
    }

    fn list_projects(&self) -> Result<Response> {
        let session = self.session()?;
        let keys = session
            .caches
            .all_projects(|| session.api.all_projects())
            .map_err(|e| GatewayError::remote("getting project list", e))?;
        Ok(Response::strings(keys))
    }

    fn get_project(&self, request: &Request) -> Result<Response> {
        let session = self.session()?;
        let name = request
            .attr_non_empty("PROJECT")
            .ok_or(GatewayError::MissingAttribute("getProject", "PROJECT"))?;
        if name.eq_ignore_ascii_case(PROJECT_ALL) {
            return Ok(Response::string(name));
        }
        session
            .caches
            .project(name, || session.api.project(name))
            .map_err(|e| {
                if e.status == Some(404) {
                    GatewayError::UnknownProjectRequested(name.to_string())
                } else {
                    GatewayError::remote(format!("retrieving project: {}", name), e)
                }
            })?;
        Ok(Response::string(name))
    }

    // ── LIST_FIELDS ──────────────────────────────────────────────────────

    fn list_fields(&self, request: &Request) -> Result<Response> {
        let session = self.session()?;
        let proj_id = request
            .attr("PROJID")
            .ok_or(GatewayError::MissingAttribute("listFields", "PROJID"))?;

        let issue_types = self.issue_types_for(session, proj_id)?;
        let priorities = list_remote(session.api.priorities())?;
        let resolutions = list_remote(session.api.resolutions())?;
        let statuses = list_remote(session.api.statuses())?;
        let registry = list_remote(session.api.fields())?;

        let mut descs = vec![
            Desc::new(FIELD_KEY, FieldType::Word, Access::DefectId),
            Desc::new(FIELD_REPORTER, FieldType::Word, Access::Ro),
            Desc::new(FIELD_ASSIGNEE, FieldType::Word, Access::Ro),
            Desc::new(FIELD_SUMMARY, FieldType::Line, Access::Rw),
            Desc::new(FIELD_DESCRIPTION, FieldType::Text, Access::Rw),
            Desc::new(FIELD_ENVIRONMENT, FieldType::Text, Access::Rw),
            Desc::new(FIELD_COMMENTS, FieldType::Text, Access::Ro),
            Desc::new(FIELD_DUEDATE, FieldType::Date, Access::Ro),
            Desc::new(FIELD_UPDATED, FieldType::Date, Access::ModDate),
            Desc::new(FIELD_ISSUETYPE, FieldType::Select, Access::Rw)
                .with_values(names(&issue_types)),
            Desc::new(FIELD_PRIORITY, FieldType::Select, Access::Rw)
                .with_values(names(&priorities)),
            Desc::new(FIELD_RESOLUTION, FieldType::Select, Access::Ro)
                .with_values(names(&resolutions)),
            Desc::new(FIELD_STATUS, FieldType::Select, Access::Ro).with_values(names(&statuses)),
            Desc::new(FIELD_AFFECTSVERSIONS, FieldType::Line, Access::Ro),
            Desc::new(FIELD_FIXVERSIONS, FieldType::Line, Access::Ro),
            Desc::new(FIELD_COMPONENTS, FieldType::Line, Access::Ro),
            Desc::new(FIELD_FIX, FieldType::Fix, Access::Rw),
        ];

        if let Some(desc) = status_resolution_desc(&session.config, &statuses, &resolutions) {
            descs.push(desc);
        }
        descs.extend(custom_field_descs(&session.config, &registry));
        Ok(Response::Descs(descs))
    }

    fn issue_types_for(&self, session: &Session, proj_id: &str) -> Result<Vec<NamedId>> {
        if proj_id.is_empty() || proj_id.eq_ignore_ascii_case(PROJECT_ALL) {
            list_remote(session.api.issue_types())
        } else {
            Ok(list_remote(session.api.project(proj_id))?.issue_types)
        }
    }

    // ── SEGMENT_FILTERS ──────────────────────────────────────────────────

    fn segment_filters(&mut self, request: &Request) -> Result<Response> {
        let proj_id = request.attr("PROJID").unwrap_or_default().to_string();
        let project_list = request.attr("PROJECT_LIST").map(str::to_string);
        let raw_filter = request
            .attr("SEGMENT_FILTER")
            .filter(|f| !f.trim().is_empty())
            .map(str::to_string);

        let translated = match &raw_filter {
            Some(raw) => {
                let session = self.session()?;
                let issue_types = self.issue_types_for(session, &proj_id)?;
                let statuses = list_remote(session.api.statuses())?;
                let resolutions = list_remote(session.api.resolutions())?;
                let priorities = list_remote(session.api.priorities())?;
                let registry = list_remote(session.api.fields())?;
                let custom_names: Vec<String> = registry
                    .iter()
                    .filter(|f| f.custom)
                    .map(|f| f.name.clone())
                    .collect();
                let tables = FilterTables {
                    custom_field_names: &custom_names,
                    issue_types: &issue_types,
                    statuses: &statuses,
                    resolutions: &resolutions,
                    priorities: &priorities,
                };
                let translated = translate_filter(raw, &tables);
                tracing::debug!("SEGMENT_FILTER: {}", translated);
                Some(translated)
            }
            None => None,
        };

        let session = self.session_mut()?;
        session.project_list = project_list;
        session.segment_filter = translated;
        Ok(Response::string("OK"))
    }

    // ── LIST_DEFECTS ─────────────────────────────────────────────────────

    fn list_defects(&self, request: &Request) -> Result<Response> {
        let session = self.session()?;
        let proj_id = request
            .attr("PROJID")
            .ok_or(GatewayError::MissingAttribute("listDefects", "PROJID"))?;

        // Segmenting on the synthetic combination field cannot be
        // expressed in JQL.
        if let Some(filter) = &session.segment_filter {
            if filter.to_lowercase().contains("(status/resolution=") {
                return Err(GatewayError::StatusResolutionSegment);
            }
        }

        let date = match request.attr_non_empty("DATE") {
            Some(raw) => Some(
                dates::parse_wire(raw)
                    .map(dates::format_wire)
                    .map_err(|_| GatewayError::InvalidDate)?,
            ),
            None => None,
        };
        let mod_date = request.attr_non_empty("MODDATE").map(str::to_string);
        let limit = request
            .attr_non_empty("MAX")
            .and_then(|max| match max.parse::<i64>() {
                Ok(n) => Some(n),
                Err(e) => {
                    tracing::warn!("error parsing max issues limit '{}': {}", max, e);
                    None
                }
            })
            .filter(|n| *n > 0)
            .map(|n| n as u32)
            .unwrap_or(DEFAULT_QUERY_LIMIT);

        let projects = self.effective_projects(session, proj_id)?;

        let mut keys: Vec<String> = Vec::new();
        if session.config.query_legacy() || projects.len() == 1 {
            for project in &projects {
                let found = self.query_defects(
                    session,
                    Some(project),
                    None,
                    date.as_deref(),
                    mod_date.as_deref(),
                    limit,
                )?;
                for key in found {
                    if !keys.contains(&key) {
                        keys.push(key);
                    }
                }
            }
        } else {
            keys = self.query_defects(
                session,
                None,
                Some(&projects),
                date.as_deref(),
                mod_date.as_deref(),
                limit,
            )?;
        }

        Ok(Response::strings(keys))
    }

    /// Resolve the PROJID attribute to the effective project list.
    ///
    /// A concrete project id stands alone. `*All*` segmented on projects
    /// narrows to the accessible subset of the segment (an empty subset
    /// is an error). `*All*` unsegmented defaults to every project under
    /// the legacy query style, and to no project clause otherwise.
    fn effective_projects(&self, session: &Session, proj_id: &str) -> Result<Vec<String>> {
        if !proj_id.eq_ignore_ascii_case(PROJECT_ALL) {
            return Ok(vec![proj_id.to_string()]);
        }
        match &session.project_list {
            Some(list) if !list.eq_ignore_ascii_case(PROJECT_ALL) => {
                let mut accessible = Vec::new();
                for project in list.split(PROJECT_SEPARATOR) {
                    let project = project.trim();
                    if project.is_empty() {
                        continue;
                    }
                    if self.has_project_access(session, project)? {
                        accessible.push(project.to_string());
                    }
                }
                if accessible.is_empty() {
                    return Err(GatewayError::NoProjectAccess);
                }
                Ok(accessible)
            }
            _ => {
                if session.config.query_legacy() {
                    session
                        .caches
                        .all_projects(|| session.api.all_projects())
                        .map_err(|e| GatewayError::remote("retrieving all projects", e))
                } else {
                    Ok(Vec::new())
                }
            }
        }
    }

    /// Probe whether the session user can see issues in the project. An
    /// admin can often fetch a project whose issues it cannot search, so
    /// the probe is a minimal JQL search, not a project fetch.
    fn has_project_access(&self, session: &Session, project: &str) -> Result<bool> {
        session
            .caches
            .has_project_access(project, || {
                let jql = format!("project = \"{}\" and updated < '2006/1/1'", project);
                session.api.search(&jql, 1, 0).map(|_| ())
            })
            .map_err(|e| GatewayError::remote("checking project access", e))
    }

    fn query_defects(
        &self,
        session: &Session,
        proj_id: Option<&str>,
        projects: Option<&[String]>,
        date: Option<&str>,
        mod_date: Option<&str>,
        limit: u32,
    ) -> Result<Vec<String>> {
        if let Some(project) = proj_id {
            session
                .caches
                .project(project, || session.api.project(project))
                .map_err(|e| project_error(project, e))?;
        }

        let mut builder = JqlBuilder::new();
        if let Some(project) = proj_id {
            builder = builder.proj_id(project);
        } else if let Some(projects) = projects {
            builder = builder.projects(projects);
        }
        if let (Some(date), Some(mod_date)) = (date, mod_date) {
            builder = builder.date(date).mod_date(mod_date);
        }
        if let Some(filter) = &session.segment_filter {
            builder = builder.segment_filter(filter);
        }
        let query = builder.order_by("ORDER BY key ASC").build()?;

        tracing::info!(
            "query with batch size ({}): {}",
            self.options.batch_size,
            query
        );

        let config = &session.config;
        let outcome = run_paged_query(
            session.api.as_ref(),
            &query,
            limit,
            self.options.batch_size,
            |project| config.is_ignored_project(project),
        )
        .map_err(|e| {
            GatewayError::remote(
                format!(
                    "retrieving defects from project: {}, query = '{}'",
                    proj_id.unwrap_or("multiple projects"),
                    query
                ),
                e,
            )
        })?;
        if outcome.ignored > 0 {
            tracing::debug!("ignored {} issue(s) from ignored projects", outcome.ignored);
        }
        Ok(outcome.keys)
    }

    // ── Defect operations ────────────────────────────────────────────────

    fn get_defect(&self, request: &Request) -> Result<Response> {
        let session = self.session()?;
        request
            .attr_non_empty("PROJID")
            .ok_or(GatewayError::MissingAttribute("getDefect", "PROJID"))?;
        let defect_id = request
            .attr_non_empty("DEFECT")
            .ok_or(GatewayError::MissingAttribute("getDefect", "DEFECT"))?;

        let issue = fetch_issue(session.api.as_ref(), defect_id)?;
        let map = mapping::defect_fields(&issue, &session.config);

        let mut fields = field_pairs(&map);
        fields.push((PROJECT_FIELD.to_string(), issue.project_key.clone()));
        Ok(Response::Fields(fields))
    }

    fn new_defect(&self, request: &Request) -> Result<Response> {
        let session = self.session()?;
        let proj_id = request
            .attr_non_empty("PROJID")
            .ok_or(GatewayError::MissingAttribute("newDefect", "PROJID"))?;
        if proj_id.eq_ignore_ascii_case(PROJECT_ALL) {
            return Err(GatewayError::InvalidAttribute("newDefect", "PROJID"));
        }
        session
            .api
            .project(proj_id)
            .map_err(|e| project_error(proj_id, e))?;

        let registry = list_remote(session.api.fields())?;
        let map = mapping::default_defect_fields(&registry);

        let mut fields = field_pairs(&map);
        fields.push((PROJECT_FIELD.to_string(), proj_id.to_string()));
        Ok(Response::Fields(fields))
    }

    fn create_defect(&self, request: &Request) -> Result<Response> {
        let session = self.session()?;
        let proj_id = request
            .field("PROJID")
            .ok_or(GatewayError::MissingAttribute("createDefect", "PROJID"))?
            .to_string();
        if proj_id.eq_ignore_ascii_case(PROJECT_ALL) {
            return Err(GatewayError::InvalidAttribute("createDefect", "PROJID"));
        }
        session
            .api
            .project(&proj_id)
            .map_err(|e| project_error(&proj_id, e))?;

        let mut defect_fields = request_field_map(request);
        defect_fields.remove(PROJECT_FIELD);

        let input = mapping::build_create_input(
            &proj_id,
            &defect_fields,
            session.api.as_ref(),
            &session.config,
            &session.username,
        )?;
        let key = session
            .api
            .create_issue(&input)
            .map_err(|e| GatewayError::remote("creating defect", e))?;
        let issue = fetch_issue(session.api.as_ref(), &key)?;

        // Only transition when the requested status/resolution actually
        // differs from what the new issue got.
        if !mapping::is_different_status_resolution(&issue, &defect_fields) {
            defect_fields.remove(FIELD_STATUS);
        }
        let issue = self.apply_status_change(session, issue, &mut defect_fields)?;

        Ok(Response::string(issue.key))
    }

    fn save_defect(&self, request: &Request) -> Result<Response> {
        let session = self.session()?;
        request
            .field("PROJID")
            .ok_or(GatewayError::MissingAttribute("saveDefect", "PROJID"))?;
        let defect_id = request
            .field("DEFECTID")
            .ok_or(GatewayError::MissingAttribute("saveDefect", "DEFECTID"))?
            .to_string();

        let issue = fetch_issue(session.api.as_ref(), &defect_id)?;

        let mut defect_fields = request_field_map(request);
        defect_fields.remove(PROJECT_FIELD);

        let issue = self.update_issue(session, issue, defect_fields)?;
        Ok(Response::string(issue.key))
    }

    /// The status/resolution update state machine for saves: transition
    /// when the requested pair differs, then a plain full-issue update,
    /// then a re-fetch so callers observe authoritative state.
    fn update_issue(
        &self,
        session: &Session,
        issue: Issue,
        mut defect_fields: FieldMap,
    ) -> Result<Issue> {
        let mut transition: Option<TransitionOption> = None;
        let mut transition_fields: Vec<(String, serde_json::Value)> = Vec::new();

        if mapping::is_different_status_resolution(&issue, &defect_fields) {
            if let Some(status) = take_first(&mut defect_fields, FIELD_STATUS) {
                let found = mapping::transition_for_target_status(
                    session.api.as_ref(),
                    &session.config.workflows,
                    &issue,
                    &status,
                )?;
                if let Some(resolution) = take_first(&mut defect_fields, FIELD_RESOLUTION) {
                    transition_fields.push((
                        "resolution".to_string(),
                        serde_json::json!({ "name": resolution }),
                    ));
                }
                transition = Some(found);
            }
        } else {
            // No status change requested: nothing to transition, and
            // status/resolution are not plain updatable fields.
            defect_fields.remove(FIELD_STATUS);
            defect_fields.remove(FIELD_RESOLUTION);
        }

        let comment = take_first(&mut defect_fields, FIELD_FIX);

        let input = mapping::translate_update_fields(
            &defect_fields,
            session.api.as_ref(),
            &session.config,
        )?;

        if let Some(transition) = transition {
            session
                .api
                .transition_issue(
                    &issue.key,
                    &TransitionInput {
                        id: transition.id,
                        fields: transition_fields,
                        comment,
                    },
                )
                .map_err(|e| GatewayError::remote("updating defect", e))?;
        } else if let Some(comment) = &comment {
            session
                .api
                .add_comment(&issue.key, comment)
                .map_err(|e| GatewayError::remote("updating defect", e))?;
        }

        session
            .api
            .update_issue(&issue.key, &input)
            .map_err(|e| GatewayError::remote("updating defect", e))?;

        fetch_issue(session.api.as_ref(), &issue.key)
    }

    /// The status-only step used after create: transition (with
    /// resolution and fix comment) when requested, then re-fetch.
    fn apply_status_change(
        &self,
        session: &Session,
        issue: Issue,
        defect_fields: &mut FieldMap,
    ) -> Result<Issue> {
        let mut transition: Option<TransitionOption> = None;
        let mut transition_fields: Vec<(String, serde_json::Value)> = Vec::new();

        if let Some(status) = take_first(defect_fields, FIELD_STATUS) {
            let found = mapping::transition_for_target_status(
                session.api.as_ref(),
                &session.config.workflows,
                &issue,
                &status,
            )?;
            if let Some(resolution) = take_first(defect_fields, FIELD_RESOLUTION) {
                transition_fields.push((
                    "resolution".to_string(),
                    serde_json::json!({ "name": resolution }),
                ));
            }
            transition = Some(found);
        }
        let comment = take_first(defect_fields, FIELD_FIX);

        if let Some(transition) = transition {
            session
                .api
                .transition_issue(
                    &issue.key,
                    &TransitionInput {
                        id: transition.id,
                        fields: transition_fields,
                        comment,
                    },
                )
                .map_err(|e| GatewayError::remote("updating defect status", e))?;
        }

        fetch_issue(session.api.as_ref(), &issue.key)
    }

    /// The server version reported at LOGIN, for diagnostics.
    pub fn server_version(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.server_version.as_str())
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────

fn fetch_issue(api: &dyn JiraApi, key: &str) -> Result<Issue> {
    api.issue(key).map_err(|e| {
        if e.status == Some(404) {
            GatewayError::DefectNotFound(key.to_string())
        } else {
            GatewayError::remote(format!("retrieving defect: {}", key), e)
        }
    })
}

fn project_error(project: &str, e: JiraError) -> GatewayError {
    if e.status == Some(404) {
        GatewayError::UnknownProject(project.to_string())
    } else {
        GatewayError::remote(format!("retrieving project: {}", project), e)
    }
}

fn list_remote<T>(result: JiraResult<T>) -> Result<T> {
    result.map_err(|e| GatewayError::remote("retrieving metadata", e))
}

fn names(entries: &[NamedId]) -> Vec<String> {
    entries.iter().map(|e| e.name.clone()).collect()
}

/// Collect the request's Field children into an ordered defect record.
fn request_field_map(request: &Request) -> FieldMap {
    let mut map = FieldMap::new();
    for (name, value) in request.fields() {
        map.insert_one(name.clone(), value.clone());
    }
    map
}

/// Remove a field and yield its first non-empty value.
fn take_first(map: &mut FieldMap, name: &str) -> Option<String> {
    map.remove(name)
        .and_then(|values| values.into_iter().next())
        .filter(|v| !v.trim().is_empty())
}

/// Flatten a defect record to wire pairs (first value per field).
fn field_pairs(map: &FieldMap) -> Vec<(String, String)> {
    map.iter()
        .map(|(name, values)| {
            (
                name.to_string(),
                values.first().cloned().unwrap_or_default(),
            )
        })
        .collect()
}

/// The status/resolution combination descriptor: plain statuses, then
/// status/resolution combinations for every status reachable through a
/// resolution transition.
fn status_resolution_desc(
    config: &Config,
    statuses: &[NamedId],
    resolutions: &[NamedId],
) -> Option<Desc> {
    let mut combos: Vec<String> = names(statuses);
    for status in statuses {
        if !config.is_resolution_status(&status.name) || resolutions.is_empty() {
            continue;
        }
        combos.retain(|c| c != &status.name);
        for resolution in resolutions {
            let combo = format!("{}/{}", status.name, resolution.name);
            if !combos.contains(&combo) {
                combos.push(combo);
            }
        }
    }
    if combos.is_empty() {
        return None;
    }
    Some(
        Desc::new(FIELD_STATUS_RESOLUTION, FieldType::Select, Access::Rw).with_values(combos),
    )
}

/// Descriptors for every remote custom field: declared fields get their
/// configured type, access and options (selects always lead with the
/// empty sentinel); undeclared ones default to a read-only line.
fn custom_field_descs(config: &Config, registry: &[crate::jira::RemoteField]) -> Vec<Desc> {
    let mut descs = Vec::new();
    for field in registry.iter().filter(|f| f.custom) {
        let mut field_type = FieldType::Line;
        let mut access = Access::Ro;
        let mut values: Option<Vec<String>> = None;
        if let Some(declared) = config.custom_field(&field.name) {
            field_type = declared.field_type;
            access = declared.access;
            if declared.field_type == FieldType::Select && !declared.options.is_empty() {
                let mut options = vec![EMPTY_SELECT_OPTION.to_string()];
                for option in &declared.options {
                    if !options.contains(option) {
                        options.push(option.clone());
                    }
                }
                values = Some(options);
            }
        }
        let mut desc = Desc::new(field.name.clone(), field_type, access);
        if let Some(values) = values {
            desc = desc.with_values(values);
        }
        descs.push(desc);
    }
    descs
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;

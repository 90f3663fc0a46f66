// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Blocking JIRA REST v2 client.
//!
//! Thin plumbing: every method maps one-to-one onto a REST endpoint and
//! returns the reduced types the dispatcher consumes. Authentication is
//! basic (username + password/API token), or bearer when the engine
//! supplies an empty username with a token.

use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

use jg_core::dates;

use super::{
    CreateMetaIssueType, Issue, IssueField, IssueInput, JiraApi, JiraError, JiraResult, NamedId,
    ProjectInfo, RemoteField, SearchPage, ServerInfo, TransitionInput, TransitionOption, User,
};

/// Authentication mode for the REST client.
#[derive(Debug, Clone)]
enum Auth {
    Basic { username: String, password: String },
    Bearer { token: String },
}

/// Blocking HTTP implementation of [`JiraApi`].
pub struct HttpJira {
    client: reqwest::blocking::Client,
    base_url: String,
    auth: Auth,
    username: String,
    /// Field registry memo used to attach display names to issue fields.
    field_registry: Mutex<Option<Vec<RemoteField>>>,
}

impl HttpJira {
    /// Build a client for the given server.
    ///
    /// An empty `username` selects bearer authentication with `password`
    /// as the token.
    pub fn new(
        server_url: &str,
        username: &str,
        password: &str,
        request_timeout: Duration,
        connection_timeout: Duration,
    ) -> JiraResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connection_timeout)
            .build()
            .map_err(|e| JiraError::new(format!("failed to build HTTP client: {}", e)))?;
        let auth = if username.trim().is_empty() {
            Auth::Bearer {
                token: password.to_string(),
            }
        } else {
            Auth::Basic {
                username: username.to_string(),
                password: password.to_string(),
            }
        };
        Ok(HttpJira {
            client,
            base_url: format!("{}/rest/api/2", server_url.trim_end_matches('/')),
            auth,
            username: username.to_string(),
            field_registry: Mutex::new(None),
        })
    }

    /// The authenticated user name (empty under bearer auth).
    pub fn username(&self) -> &str {
        &self.username
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::blocking::RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        match &self.auth {
            Auth::Basic { username, password } => builder.basic_auth(username, Some(password)),
            Auth::Bearer { token } => builder.bearer_auth(token),
        }
    }

    fn send(&self, builder: reqwest::blocking::RequestBuilder) -> JiraResult<Value> {
        let response = builder
            .send()
            .map_err(|e| JiraError::new(format!("request failed: {}", e)))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(JiraError::with_status(
                format!("{}: {}", status, truncate(&body, 500)),
                status.as_u16(),
            ));
        }
        if status == reqwest::StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }
        let text = response
            .text()
            .map_err(|e| JiraError::new(format!("failed to read response body: {}", e)))?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text)
            .map_err(|e| JiraError::new(format!("invalid JSON response: {}", e)))
    }

    fn get(&self, path: &str) -> JiraResult<Value> {
        self.send(self.request(reqwest::Method::GET, path))
    }

    fn registry(&self) -> JiraResult<Vec<RemoteField>> {
        let mut memo = self
            .field_registry
            .lock()
            .map_err(|_| JiraError::new("field registry lock poisoned"))?;
        if let Some(fields) = memo.as_ref() {
            return Ok(fields.clone());
        }
        let fields = parse_fields(&self.get("/field")?);
        *memo = Some(fields.clone());
        Ok(fields)
    }

    fn issue_from_json(&self, value: &Value) -> JiraResult<Issue> {
        let key = value["key"]
            .as_str()
            .ok_or_else(|| JiraError::new("issue without a key"))?
            .to_string();
        let f = &value["fields"];

        let mut issue = Issue {
            key,
            project_key: f["project"]["key"].as_str().unwrap_or_default().to_string(),
            summary: str_field(f, "summary"),
            description: str_field(f, "description"),
            environment: str_field(f, "environment"),
            reporter: user_field(&f["reporter"]),
            assignee: user_field(&f["assignee"]),
            comments: f["comment"]["comments"]
                .as_array()
                .map(|comments| {
                    comments
                        .iter()
                        .filter_map(|c| c["body"].as_str().map(str::to_string))
                        .collect()
                })
                .unwrap_or_default(),
            affects_versions: name_array(&f["versions"]),
            fix_versions: name_array(&f["fixVersions"]),
            components: name_array(&f["components"]),
            due_date: f["duedate"]
                .as_str()
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
            updated: f["updated"].as_str().and_then(parse_rest_timestamp),
            issue_type: named_id(&f["issuetype"]),
            priority: named_id(&f["priority"]),
            status: named_id(&f["status"]),
            resolution: named_id(&f["resolution"]),
            fields: Vec::new(),
        };

        // Attach display names so custom fields can be matched against
        // the configured registry by name.
        let registry = self.registry()?;
        if let Some(map) = f.as_object() {
            for (id, field_value) in map {
                if field_value.is_null() {
                    continue;
                }
                let Some(entry) = registry.iter().find(|r| &r.id == id) else {
                    continue;
                };
                issue.fields.push(IssueField {
                    id: id.clone(),
                    name: entry.name.clone(),
                    value: field_value.clone(),
                });
            }
        }
        Ok(issue)
    }
}

impl JiraApi for HttpJira {
    fn server_info(&self) -> JiraResult<ServerInfo> {
        let value = self.get("/serverInfo")?;
        Ok(ServerInfo {
            version: value["version"].as_str().unwrap_or_default().to_string(),
            build_number: value["buildNumber"].as_u64().unwrap_or(0),
            server_time: value["serverTime"]
                .as_str()
                .and_then(|t| dates::parse_server_info(t).ok()),
        })
    }

    fn search(&self, jql: &str, max_results: u32, start_at: u32) -> JiraResult<SearchPage> {
        let max_results = max_results.to_string();
        let start_at = start_at.to_string();
        let value = self.send(self.request(reqwest::Method::GET, "/search").query(&[
            ("jql", jql),
            ("maxResults", max_results.as_str()),
            ("startAt", start_at.as_str()),
            // Listing searches only need keys and project membership.
            ("fields", "project"),
        ]))?;
        let mut issues = Vec::new();
        if let Some(list) = value["issues"].as_array() {
            for item in list {
                issues.push(Issue {
                    key: item["key"].as_str().unwrap_or_default().to_string(),
                    project_key: item["fields"]["project"]["key"]
                        .as_str()
                        .unwrap_or_default()
                        .to_string(),
                    ..Issue::default()
                });
            }
        }
        Ok(SearchPage {
            total: value["total"].as_u64().unwrap_or(0) as u32,
            issues,
        })
    }

    fn issue(&self, key: &str) -> JiraResult<Issue> {
        let value = self.get(&format!("/issue/{}", key))?;
        self.issue_from_json(&value)
    }

    fn create_issue(&self, input: &IssueInput) -> JiraResult<String> {
        let value = self.send(
            self.request(reqwest::Method::POST, "/issue")
                .json(&input.to_json()),
        )?;
        value["key"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| JiraError::new("create issue response without a key"))
    }

    fn update_issue(&self, key: &str, input: &IssueInput) -> JiraResult<()> {
        self.send(
            self.request(reqwest::Method::PUT, &format!("/issue/{}", key))
                .json(&input.to_json()),
        )?;
        Ok(())
    }

    fn transitions(&self, key: &str) -> JiraResult<Vec<TransitionOption>> {
        let value = self.get(&format!("/issue/{}/transitions", key))?;
        Ok(value["transitions"]
            .as_array()
            .map(|list| {
                list.iter()
                    .filter_map(|t| {
                        Some(TransitionOption {
                            id: t["id"].as_str().map(str::to_string).or_else(|| {
                                t["id"].as_u64().map(|n| n.to_string())
                            })?,
                            name: t["name"].as_str()?.to_string(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    fn transition_issue(&self, key: &str, input: &TransitionInput) -> JiraResult<()> {
        let mut body = serde_json::Map::new();
        body.insert(
            "transition".to_string(),
            serde_json::json!({ "id": input.id }),
        );
        if !input.fields.is_empty() {
            let mut fields = serde_json::Map::new();
            for (id, value) in &input.fields {
                fields.insert(id.clone(), value.clone());
            }
            body.insert("fields".to_string(), Value::Object(fields));
        }
        if let Some(comment) = &input.comment {
            body.insert(
                "update".to_string(),
                serde_json::json!({ "comment": [{ "add": { "body": comment } }] }),
            );
        }
        self.send(
            self.request(
                reqwest::Method::POST,
                &format!("/issue/{}/transitions", key),
            )
            .json(&Value::Object(body)),
        )?;
        Ok(())
    }

    fn add_comment(&self, key: &str, body: &str) -> JiraResult<()> {
        self.send(
            self.request(reqwest::Method::POST, &format!("/issue/{}/comment", key))
                .json(&serde_json::json!({ "body": body })),
        )?;
        Ok(())
    }

    fn project(&self, key: &str) -> JiraResult<ProjectInfo> {
        let value = self.get(&format!("/project/{}", key))?;
        Ok(ProjectInfo {
            key: value["key"].as_str().unwrap_or(key).to_string(),
            issue_types: value["issueTypes"]
                .as_array()
                .map(|list| list.iter().filter_map(named_id).collect())
                .unwrap_or_default(),
        })
    }

    fn all_projects(&self) -> JiraResult<Vec<String>> {
        let value = self.get("/project")?;
        Ok(value
            .as_array()
            .map(|list| {
                list.iter()
                    .filter_map(|p| p["key"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default())
    }

    fn issue_types(&self) -> JiraResult<Vec<NamedId>> {
        Ok(named_id_list(&self.get("/issuetype")?))
    }

    fn priorities(&self) -> JiraResult<Vec<NamedId>> {
        Ok(named_id_list(&self.get("/priority")?))
    }

    fn resolutions(&self) -> JiraResult<Vec<NamedId>> {
        Ok(named_id_list(&self.get("/resolution")?))
    }

    fn statuses(&self) -> JiraResult<Vec<NamedId>> {
        Ok(named_id_list(&self.get("/status")?))
    }

    fn fields(&self) -> JiraResult<Vec<RemoteField>> {
        self.registry()
    }

    fn user(&self, name: &str) -> JiraResult<Option<User>> {
        let result = self.send(
            self.request(reqwest::Method::GET, "/user")
                .query(&[("username", name)]),
        );
        match result {
            Ok(value) => Ok(Some(User {
                name: str_field(&value, "name"),
                email: str_field(&value, "emailAddress"),
                display_name: str_field(&value, "displayName"),
            })),
            Err(e) if e.status == Some(404) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn create_meta(&self, project_key: &str) -> JiraResult<Vec<CreateMetaIssueType>> {
        let value = self.send(
            self.request(reqwest::Method::GET, "/issue/createmeta").query(&[
                ("projectKeys", project_key),
                ("expand", "projects.issuetypes.fields"),
            ]),
        )?;
        let mut issue_types = Vec::new();
        if let Some(projects) = value["projects"].as_array() {
            if let Some(project) = projects.first() {
                if let Some(types) = project["issuetypes"].as_array() {
                    for t in types {
                        let Some(named) = named_id(t) else {
                            continue;
                        };
                        let priorities = t["fields"]["priority"]["allowedValues"]
                            .as_array()
                            .map(|list| list.iter().filter_map(named_id).collect())
                            .unwrap_or_default();
                        issue_types.push(CreateMetaIssueType {
                            id: named.id,
                            name: named.name,
                            priorities,
                        });
                    }
                }
            }
        }
        Ok(issue_types)
    }
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value[key].as_str().map(str::to_string)
}

fn user_field(value: &Value) -> Option<User> {
    if value.is_null() {
        return None;
    }
    Some(User {
        name: str_field(value, "name"),
        email: str_field(value, "emailAddress"),
        display_name: str_field(value, "displayName"),
    })
}

fn name_array(value: &Value) -> Option<Vec<String>> {
    value.as_array().map(|list| {
        list.iter()
            .filter_map(|v| v["name"].as_str().map(str::to_string))
            .collect()
    })
}

fn named_id(value: &Value) -> Option<NamedId> {
    if value.is_null() {
        return None;
    }
    let name = value["name"].as_str()?.to_string();
    let id = value["id"]
        .as_str()
        .map(str::to_string)
        .or_else(|| value["id"].as_u64().map(|n| n.to_string()))
        // Older servers omit ids on some entities; fall back to the tail
        // of the self URI.
        .or_else(|| {
            value["self"]
                .as_str()
                .and_then(|uri| uri.rsplit('/').next())
                .map(str::to_string)
        })?;
    Some(NamedId { id, name })
}

fn parse_fields(value: &Value) -> Vec<RemoteField> {
    value
        .as_array()
        .map(|list| {
            list.iter()
                .filter_map(|f| {
                    Some(RemoteField {
                        id: f["id"].as_str()?.to_string(),
                        name: f["name"].as_str()?.to_string(),
                        custom: f["custom"].as_bool().unwrap_or(false),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

fn named_id_list(value: &Value) -> Vec<NamedId> {
    value
        .as_array()
        .map(|list| list.iter().filter_map(named_id).collect())
        .unwrap_or_default()
}

fn parse_rest_timestamp(raw: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.3f%z")
        .map(|dt| dt.naive_local())
        .ok()
        .or_else(|| dates::parse_server_info(raw).ok())
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

// src/catalog.rs
//! Curated command catalog.
//!
//! Labelled one-click commands for the docker workflow. Templates that take
//! an argument substitute it verbatim: no quoting, no validation. The
//! argument reaches the remote shell as typed, so exposing the catalog to
//! untrusted users hands them a shell on the target host.

use serde::Serialize;

use crate::config::constants::TEMPLATE_PLACEHOLDER;

/// One labelled command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommandTemplate {
    pub label: &'static str,
    pub template: &'static str,
    pub needs_argument: bool,
}

impl CommandTemplate {
    const fn fixed(label: &'static str, template: &'static str) -> Self {
        Self {
            label,
            template,
            needs_argument: false,
        }
    }

    const fn with_arg(label: &'static str, template: &'static str) -> Self {
        Self {
            label,
            template,
            needs_argument: true,
        }
    }

    /// Resolve to a runnable command.
    ///
    /// Returns an empty string when an argument is required but missing or
    /// empty; callers treat that as "not ready to run".
    pub fn resolve(&self, argument: Option<&str>) -> String {
        if !self.needs_argument {
            return self.template.to_string();
        }
        match argument {
            Some(arg) if !arg.is_empty() => self.template.replace(TEMPLATE_PLACEHOLDER, arg),
            _ => String::new(),
        }
    }
}

const DOCKER_TEMPLATES: &[CommandTemplate] = &[
    // Basics
    CommandTemplate::fixed("Docker Version", "docker --version"),
    CommandTemplate::fixed("Docker Info", "docker info"),
    CommandTemplate::fixed("List Images", "docker images"),
    CommandTemplate::fixed("List Containers (all)", "docker ps -a"),
    CommandTemplate::fixed("Run hello-world", "docker run --rm hello-world"),
    // Images and containers
    CommandTemplate::with_arg("Pull Image (name)", "docker pull {arg}"),
    CommandTemplate::with_arg("Remove Image (name/id)", "docker rmi {arg}"),
    CommandTemplate::with_arg("Create Container (name) from alpine", "docker create --name {arg} alpine"),
    CommandTemplate::with_arg("Start Container", "docker start {arg}"),
    CommandTemplate::with_arg("Stop Container", "docker stop {arg}"),
    CommandTemplate::with_arg("Remove Container", "docker rm {arg}"),
    CommandTemplate::with_arg("Container Logs", "docker logs {arg}"),
    CommandTemplate::with_arg("Exec Shell (/bin/sh)", "docker exec -it {arg} /bin/sh"),
    CommandTemplate::fixed("Live Stats", "docker stats --no-stream"),
    // Cleanup
    CommandTemplate::fixed("System Prune (all)", "docker system prune -f"),
    CommandTemplate::fixed("Prune Dangling Images", "docker image prune -f"),
    CommandTemplate::fixed("Prune Volumes", "docker volume prune -f"),
    // Networks and volumes
    CommandTemplate::fixed("List Networks", "docker network ls"),
    CommandTemplate::with_arg("Create Network", "docker network create {arg}"),
    CommandTemplate::with_arg("Remove Network", "docker network rm {arg}"),
    CommandTemplate::fixed("List Volumes", "docker volume ls"),
    CommandTemplate::with_arg("Create Volume", "docker volume create {arg}"),
    CommandTemplate::with_arg("Remove Volume", "docker volume rm {arg}"),
    // Tag and push
    CommandTemplate::with_arg("Tag Image", "docker tag {arg}"),
    CommandTemplate::with_arg("Push Image", "docker push {arg}"),
    // Inspect and copy
    CommandTemplate::with_arg("Inspect Container", "docker inspect {arg}"),
    CommandTemplate::with_arg("Inspect Image", "docker inspect {arg}"),
    CommandTemplate::with_arg("Copy out (ctr:path dest)", "docker cp {arg}"),
    CommandTemplate::fixed("Disk Usage", "docker system df"),
    CommandTemplate::with_arg("Image History", "docker history {arg}"),
    // Registry and context
    CommandTemplate::fixed("Login to Registry", "docker login"),
    CommandTemplate::fixed("Logout from Registry", "docker logout"),
    CommandTemplate::fixed("List Contexts", "docker context ls"),
    CommandTemplate::with_arg("Switch Context", "docker context use {arg}"),
    // Compose
    CommandTemplate::fixed("Compose Version", "docker compose version"),
    CommandTemplate::fixed("Compose Up (detached)", "docker compose up -d"),
    CommandTemplate::fixed("Compose Down", "docker compose down"),
    CommandTemplate::fixed("Compose Logs", "docker compose logs --tail 50"),
    // Builder, save and load
    CommandTemplate::fixed("List Builder Cache", "docker builder ls"),
    CommandTemplate::fixed("Prune Builder Cache", "docker builder prune -f"),
    CommandTemplate::with_arg("Builder Build (Dockerfile)", "docker build -t {arg}"),
    CommandTemplate::with_arg("Save Image to tar", "docker save {arg}"),
    CommandTemplate::with_arg("Load Image from tar", "docker load -i {arg}"),
    // Advanced
    CommandTemplate::with_arg("Top (processes in ctr)", "docker top {arg}"),
    CommandTemplate::with_arg("Checkpoint create", "docker checkpoint create {arg}"),
    CommandTemplate::with_arg("Checkpoint list", "docker checkpoint ls {arg}"),
    CommandTemplate::with_arg("Checkpoint rm", "docker checkpoint rm {arg}"),
    CommandTemplate::fixed("Image Digests", "docker image ls --digests"),
    CommandTemplate::fixed("Events (10s)", "timeout 10 docker events"),
    CommandTemplate::with_arg("Rename Container", "docker rename {arg}"),
    CommandTemplate::with_arg("Commit Container to Image", "docker commit {arg}"),
    CommandTemplate::with_arg("Update Container Resources", "docker update {arg}"),
];

/// Ordered label to template mapping
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    templates: &'static [CommandTemplate],
}

/// The docker workflow catalog
pub const DOCKER_CATALOG: Catalog = Catalog {
    templates: DOCKER_TEMPLATES,
};

impl Catalog {
    pub fn get(&self, label: &str) -> Option<&'static CommandTemplate> {
        self.templates.iter().find(|t| t.label == label)
    }

    /// Labels in catalog order
    pub fn labels(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.templates.iter().map(|t| t.label)
    }

    pub fn templates(&self) -> &'static [CommandTemplate] {
        self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        DOCKER_CATALOG
    }
}

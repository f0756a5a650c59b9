use promql_parser::parser::token;

use super::CatalogContext;
use crate::error::Result;
use crate::models::dashboard::{Dashboard, Panel, PanelGroup};
use crate::promql::builder::{self, binary};
use crate::promql::{LabelFilter, MatchType};

pub const NAMED_QUERIES: &[(&str, &str)] = &[
    (
        "kubernetes.cpu_utilisation",
        r#"1 - avg(rate(node_cpu_seconds_total{job="node-exporter",mode="idle"}[$__rate_interval]))"#,
    ),
    (
        "kubernetes.cpu_requests_commitment",
        r#"sum(kube_pod_container_resource_requests{job="kube-state-metrics",resource="cpu"}) / sum(kube_node_status_allocatable{job="kube-state-metrics",resource="cpu"})"#,
    ),
    (
        "kubernetes.memory_utilisation",
        r#"1 - sum(node_memory_MemAvailable_bytes{job="node-exporter"}) / sum(node_memory_MemTotal_bytes{job="node-exporter"})"#,
    ),
    (
        "kubernetes.memory_requests_commitment",
        r#"sum(kube_pod_container_resource_requests{job="kube-state-metrics",resource="memory"}) / sum(kube_node_status_allocatable{job="kube-state-metrics",resource="memory"})"#,
    ),
    (
        "kubernetes.cpu_usage",
        r#"sum by (pod) (rate(container_cpu_usage_seconds_total{container!="",image!=""}[$__rate_interval]))"#,
    ),
    (
        "kubernetes.memory_working_set",
        r#"sum by (pod) (container_memory_working_set_bytes{container!="",image!=""})"#,
    ),
];

fn namespace_filter() -> LabelFilter {
    LabelFilter::equal("namespace", "$namespace")
}

/// Cluster-wide resource usage, broken down by namespace and pod.
pub fn cluster_resources(ctx: &CatalogContext) -> Result<Dashboard> {
    let namespace = [namespace_filter()];
    let ksm = [LabelFilter::equal("job", "kube-state-metrics")];

    let headlines = PanelGroup::new(
        "Headlines",
        vec![
            Panel::new("CPU Utilisation", "percentunit")
                .query(ctx.named_query("kubernetes.cpu_utilisation", &[])?, None),
            Panel::new("CPU Requests Commitment", "percentunit")
                .query(ctx.named_query("kubernetes.cpu_requests_commitment", &[])?, None),
            Panel::new("Memory Utilisation", "percentunit")
                .query(ctx.named_query("kubernetes.memory_utilisation", &[])?, None),
            Panel::new("Memory Requests Commitment", "percentunit")
                .query(ctx.named_query("kubernetes.memory_requests_commitment", &[])?, None),
        ],
    );

    let pods_per_node = builder::on_group_left(
        binary(
            token::T_MUL,
            builder::sum_by("kube_pod_info", &["node"], &ksm),
            builder::max_by("kube_node_info", &["node", "kernel_version"], &ksm),
        ),
        &["node"],
        &["kernel_version"],
    );

    let workloads = PanelGroup::new(
        "Workloads",
        vec![
            Panel::new("Pods per Namespace", "short").query(
                ctx.builder_query(&builder::sum_by("kube_pod_info", &["namespace"], &ksm), &[]),
                Some("{{namespace}}"),
            ),
            Panel::new("Pods per Node", "short")
                .description("Running pods per node, annotated with the node kernel version.")
                .query(
                    ctx.builder_query(&pods_per_node, &[]),
                    Some("{{node}} ({{kernel_version}})"),
                ),
            Panel::new("Container Restarts", "short")
                .query(
                    ctx.builder_query(
                        &builder::sum_by_increase(
                            "kube_pod_container_status_restarts_total",
                            &["pod"],
                            &ksm,
                        ),
                        &namespace,
                    ),
                    Some("{{pod}}"),
                ),
        ],
    );

    let not_pause = [LabelFilter::new("container", MatchType::NotEqual, "POD")];
    let namespace_usage = PanelGroup::new(
        "Namespace: $namespace",
        vec![
            Panel::new("CPU Usage", "cores")
                .query(ctx.named_query("kubernetes.cpu_usage", &namespace)?, Some("{{pod}}")),
            Panel::new("Memory Working Set", "bytes").query(
                ctx.named_query("kubernetes.memory_working_set", &namespace)?,
                Some("{{pod}}"),
            ),
            Panel::new("Network Receive", "Bps").query(
                ctx.builder_query(
                    &builder::sum_by_rate(
                        "container_network_receive_bytes_total",
                        &["pod"],
                        &not_pause,
                    ),
                    &namespace,
                ),
                Some("{{pod}}"),
            ),
            Panel::new("Network Transmit", "Bps").query(
                ctx.builder_query(
                    &builder::sum_by_rate(
                        "container_network_transmit_bytes_total",
                        &["pod"],
                        &not_pause,
                    ),
                    &namespace,
                ),
                Some("{{pod}}"),
            ),
        ],
    );

    Ok(ctx
        .dashboard(
            "kubernetes-cluster-resources",
            "Kubernetes / Compute Resources / Cluster",
        )
        .with_variable(ctx.variable("namespace", "Namespace", "kube_namespace_status_phase")?)
        .with_group(headlines)
        .with_group(workloads)
        .with_group(namespace_usage))
}

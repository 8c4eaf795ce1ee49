//! Terraform schema for `chaos-mesh.org/v1alpha1` Workflow objects
//!
//! Mirrors the CRD's OpenAPI schema attribute by attribute. Shared shapes
//! (selectors, the chaos variants) are built by helpers so that templates and
//! schedules declare exactly the same nested attributes.

use crate::schema::{AttributeType, PlanModifier, SchemaAttribute, SchemaBlock, Validator};

const MODES: &[&str] = &["one", "all", "fixed", "fixed-percent", "random-max-percent"];

const TEMPLATE_TYPES: &[&str] = &[
    "Task",
    "Serial",
    "Parallel",
    "Suspend",
    "Schedule",
    "StatusCheck",
    "AWSChaos",
    "AzureChaos",
    "BlockChaos",
    "DNSChaos",
    "GCPChaos",
    "HTTPChaos",
    "IOChaos",
    "JVMChaos",
    "KernelChaos",
    "NetworkChaos",
    "PhysicalMachineChaos",
    "PodChaos",
    "StressChaos",
    "TimeChaos",
];

const SCHEDULE_TYPES: &[&str] = &[
    "AWSChaos",
    "AzureChaos",
    "BlockChaos",
    "DNSChaos",
    "GCPChaos",
    "HTTPChaos",
    "IOChaos",
    "JVMChaos",
    "KernelChaos",
    "NetworkChaos",
    "PhysicalMachineChaos",
    "PodChaos",
    "StressChaos",
    "TimeChaos",
];

const PHYSICAL_MACHINE_ACTIONS: &[&str] = &[
    "stress-cpu",
    "stress-mem",
    "disk-read-payload",
    "disk-write-payload",
    "disk-fill",
    "network-corrupt",
    "network-duplicate",
    "network-loss",
    "network-delay",
    "network-partition",
    "network-dns",
    "network-bandwidth",
    "network-flood",
    "network-down",
    "process",
    "jvm-exception",
    "jvm-gc",
    "jvm-latency",
    "jvm-return",
    "jvm-stress",
    "jvm-rule-data",
    "jvm-mysql",
    "clock",
    "redis-expiration",
    "redis-penetration",
    "redis-cacheLimit",
    "redis-restart",
    "redis-stop",
    "kafka-fill",
    "kafka-flood",
    "kafka-io",
    "http-abort",
    "http-delay",
    "http-config",
    "http-request",
    "file-create",
    "file-modify",
    "file-delete",
    "file-rename",
    "file-append",
    "file-replace",
    "vm",
    "user_defined",
];

fn req_string(desc: &str) -> SchemaAttribute {
    SchemaAttribute::string().with_description(desc).required()
}

fn opt_string(desc: &str) -> SchemaAttribute {
    SchemaAttribute::string().with_description(desc).optional()
}

fn req_int64(desc: &str) -> SchemaAttribute {
    SchemaAttribute::int64().with_description(desc).required()
}

fn opt_int64(desc: &str) -> SchemaAttribute {
    SchemaAttribute::int64().with_description(desc).optional()
}

fn opt_bool(desc: &str) -> SchemaAttribute {
    SchemaAttribute::bool().with_description(desc).optional()
}

fn opt_string_list(desc: &str) -> SchemaAttribute {
    SchemaAttribute::list(AttributeType::String)
        .with_description(desc)
        .optional()
}

fn opt_string_map(desc: &str) -> SchemaAttribute {
    SchemaAttribute::map(AttributeType::String)
        .with_description(desc)
        .optional()
}

fn opt_nested(block: SchemaBlock, desc: &str) -> SchemaAttribute {
    SchemaAttribute::single_nested(block)
        .with_description(desc)
        .optional()
}

/// `metadata` as declared by every Chaos Mesh resource
pub fn metadata_attribute() -> SchemaAttribute {
    let block = SchemaBlock::new()
        .with_attribute(
            "name",
            req_string("Unique identifier for this object within its namespace.")
                .with_validator(Validator::DnsSubdomain)
                .with_plan_modifier(PlanModifier::RequiresReplace),
        )
        .with_attribute(
            "namespace",
            req_string("Namespace the object belongs to.")
                .with_validator(Validator::DnsLabel)
                .with_plan_modifier(PlanModifier::RequiresReplace),
        )
        .with_attribute(
            "labels",
            opt_string_map("Map of string keys and values used to organize and categorize objects.")
                .with_validator(Validator::Labels),
        )
        .with_attribute(
            "annotations",
            opt_string_map("Unstructured key value map stored with the object.")
                .with_validator(Validator::Annotations),
        );

    SchemaAttribute::single_nested(block)
        .with_description("Data that helps uniquely identify this object.")
        .required()
}

/// `spec` of a Workflow
pub fn spec_attribute() -> SchemaAttribute {
    let block = SchemaBlock::new()
        .with_attribute("entry", req_string("Name of the template the workflow starts with."))
        .with_attribute(
            "templates",
            SchemaAttribute::list_nested(template_block())
                .with_description("Templates making up the workflow.")
                .required(),
        );

    SchemaAttribute::single_nested(block)
        .with_description("WorkflowSpec defines the desired state of Workflow")
        .required()
}

fn template_block() -> SchemaBlock {
    let block = SchemaBlock::new()
        .with_attribute("name", req_string("Name of the template."))
        .with_attribute(
            "template_type",
            req_string("Kind of node this template creates.").one_of(TEMPLATE_TYPES),
        )
        .with_attribute(
            "deadline",
            opt_string("Time limit for the node, a duration string such as '30s'."),
        )
        .with_attribute(
            "children",
            opt_string_list("Templates run by Serial and Parallel nodes."),
        )
        .with_attribute(
            "conditional_branches",
            SchemaAttribute::list_nested(
                SchemaBlock::new()
                    .with_attribute("target", req_string("Template to run when the expression holds."))
                    .with_attribute(
                        "expression",
                        opt_string("Expression evaluated against the task result. Empty means always true."),
                    ),
            )
            .with_description("Branches chosen after a Task completes.")
            .optional(),
        )
        .with_attribute("task", opt_nested(task_block(), "Task run as a pod."))
        .with_attribute(
            "schedule",
            opt_nested(schedule_block(), "Chaos run on a cron schedule."),
        )
        .with_attribute(
            "status_check",
            opt_nested(status_check_block(), "Status check performed by a StatusCheck node."),
        )
        .with_attribute(
            "abort_with_status_check",
            opt_bool("Abort the workflow when the status check fails."),
        );

    with_embedded_chaos(block)
}

fn task_block() -> SchemaBlock {
    let env = SchemaBlock::new()
        .with_attribute("name", req_string("Name of the environment variable."))
        .with_attribute("value", opt_string("Value of the environment variable."));

    let resources = SchemaBlock::new()
        .with_attribute("limits", opt_string_map("Maximum amount of compute resources allowed."))
        .with_attribute("requests", opt_string_map("Minimum amount of compute resources required."));

    let container = SchemaBlock::new()
        .with_attribute("name", req_string("Name of the container."))
        .with_attribute("image", opt_string("Container image name."))
        .with_attribute("command", opt_string_list("Entrypoint array."))
        .with_attribute("args", opt_string_list("Arguments to the entrypoint."))
        .with_attribute("working_dir", opt_string("Container's working directory."))
        .with_attribute(
            "image_pull_policy",
            opt_string("Image pull policy.").one_of(&["Always", "Never", "IfNotPresent"]),
        )
        .with_attribute(
            "env",
            SchemaAttribute::list_nested(env)
                .with_description("Environment variables to set in the container.")
                .optional(),
        )
        .with_attribute(
            "resources",
            opt_nested(resources, "Compute resources required by this container."),
        );

    let volume = SchemaBlock::new()
        .with_attribute("name", req_string("Name of the volume."))
        .with_attribute(
            "config_map",
            opt_nested(
                SchemaBlock::new()
                    .with_attribute("name", opt_string("Name of the referent."))
                    .with_attribute("optional", opt_bool("Whether the ConfigMap must exist.")),
                "ConfigMap that should populate this volume.",
            ),
        )
        .with_attribute(
            "secret",
            opt_nested(
                SchemaBlock::new()
                    .with_attribute("secret_name", opt_string("Name of the secret."))
                    .with_attribute("optional", opt_bool("Whether the Secret must exist.")),
                "Secret that should populate this volume.",
            ),
        )
        .with_attribute(
            "empty_dir",
            opt_nested(
                SchemaBlock::new()
                    .with_attribute("medium", opt_string("Storage medium backing this directory."))
                    .with_attribute("size_limit", opt_string("Total amount of local storage required.")),
                "Temporary directory that shares a pod's lifetime.",
            ),
        );

    SchemaBlock::new()
        .with_attribute("container", opt_nested(container, "Container the task runs."))
        .with_attribute(
            "volumes",
            SchemaAttribute::list_nested(volume)
                .with_description("Volumes available to the task container.")
                .optional(),
        )
}

fn schedule_block() -> SchemaBlock {
    let block = SchemaBlock::new()
        .with_attribute("schedule", req_string("Cron expression."))
        .with_attribute(
            "type",
            req_string("Kind of chaos the schedule creates.").one_of(SCHEDULE_TYPES),
        )
        .with_attribute(
            "concurrency_policy",
            opt_string("Whether runs may overlap.").one_of(&["Forbid", "Allow"]),
        )
        .with_attribute(
            "history_limit",
            opt_int64("Number of finished runs to keep.").at_least(1),
        )
        .with_attribute(
            "starting_deadline_seconds",
            opt_int64("Deadline in seconds for starting a missed run.").at_least(0),
        );

    with_embedded_chaos(block)
}

fn status_check_block() -> SchemaBlock {
    let criteria = SchemaBlock::new().with_attribute(
        "status_code",
        req_string("Expected status code, a single code or a range such as '200-399'."),
    );

    let http = SchemaBlock::new()
        .with_attribute("url", req_string("URL to probe."))
        .with_attribute("method", opt_string("HTTP method.").one_of(&["GET", "POST"]))
        .with_attribute(
            "headers",
            SchemaAttribute::map(AttributeType::List(Box::new(AttributeType::String)))
                .with_description("Request headers.")
                .optional(),
        )
        .with_attribute("body", opt_string("Request body."))
        .with_attribute(
            "criteria",
            SchemaAttribute::single_nested(criteria)
                .with_description("Criteria the response must meet.")
                .required(),
        );

    SchemaBlock::new()
        .with_attribute(
            "mode",
            opt_string("Synchronous checks finish the node; continuous ones run alongside.")
                .one_of(&["Synchronous", "Continuous"]),
        )
        .with_attribute("type", req_string("Type of the check.").one_of(&["HTTP"]))
        .with_attribute("duration", opt_string("How long a continuous check runs."))
        .with_attribute(
            "timeout_seconds",
            opt_int64("Seconds after which a probe times out.").at_least(1),
        )
        .with_attribute(
            "interval_seconds",
            opt_int64("Seconds between probes.").at_least(1),
        )
        .with_attribute(
            "failure_threshold",
            opt_int64("Consecutive failures before the check fails.").at_least(1),
        )
        .with_attribute(
            "success_threshold",
            opt_int64("Consecutive successes before the check succeeds.").at_least(1),
        )
        .with_attribute(
            "records_history_limit",
            opt_int64("Number of probe records to keep.").between(1, 1000),
        )
        .with_attribute("http", opt_nested(http, "HTTP probe."))
}

// ============================================================================
// Selectors
// ============================================================================

fn expression_selectors_attribute() -> SchemaAttribute {
    let requirement = SchemaBlock::new()
        .with_attribute("key", req_string("Label key the selector applies to."))
        .with_attribute(
            "operator",
            req_string("Relationship between the key and the values.")
                .one_of(&["In", "NotIn", "Exists", "DoesNotExist"]),
        )
        .with_attribute("values", opt_string_list("Values compared against the label."));

    SchemaAttribute::list_nested(requirement)
        .with_description("Label selector requirements.")
        .optional()
}

fn pod_selector_spec_block() -> SchemaBlock {
    SchemaBlock::new()
        .with_attribute("namespaces", opt_string_list("Namespaces to select pods from."))
        .with_attribute("nodes", opt_string_list("Nodes whose pods are selected."))
        .with_attribute(
            "pods",
            SchemaAttribute::map(AttributeType::List(Box::new(AttributeType::String)))
                .with_description("Pod names per namespace.")
                .optional(),
        )
        .with_attribute("node_selectors", opt_string_map("Node label selector."))
        .with_attribute("field_selectors", opt_string_map("Pod field selector."))
        .with_attribute("label_selectors", opt_string_map("Pod label selector."))
        .with_attribute("annotation_selectors", opt_string_map("Pod annotation selector."))
        .with_attribute("expression_selectors", expression_selectors_attribute())
        .with_attribute(
            "pod_phase_selectors",
            opt_string_list("Pod phases to select, such as 'Running'."),
        )
}

fn with_pod_selector(block: SchemaBlock) -> SchemaBlock {
    block
        .with_attribute("mode", req_string("How targets are picked from the selection.").one_of(MODES))
        .with_attribute(
            "value",
            opt_string("Parameter of fixed, fixed-percent and random-max-percent modes."),
        )
        .with_attribute(
            "selector",
            SchemaAttribute::single_nested(pod_selector_spec_block())
                .with_description("Selects the target pods.")
                .required(),
        )
}

fn with_container_selector(block: SchemaBlock) -> SchemaBlock {
    with_pod_selector(block).with_attribute(
        "container_names",
        opt_string_list("Containers to inject into. Empty means every container."),
    )
}

fn with_common(block: SchemaBlock) -> SchemaBlock {
    block
        .with_attribute("duration", opt_string("How long the chaos lasts."))
        .with_attribute("remote_cluster", opt_string("Cluster the chaos is injected into."))
}

// ============================================================================
// Chaos variants
// ============================================================================

fn with_embedded_chaos(block: SchemaBlock) -> SchemaBlock {
    block
        .with_attribute("aws_chaos", opt_nested(aws_chaos_block(), "AWSChaos experiment."))
        .with_attribute("azure_chaos", opt_nested(azure_chaos_block(), "AzureChaos experiment."))
        .with_attribute("block_chaos", opt_nested(block_chaos_block(), "BlockChaos experiment."))
        .with_attribute("dns_chaos", opt_nested(dns_chaos_block(), "DNSChaos experiment."))
        .with_attribute("gcp_chaos", opt_nested(gcp_chaos_block(), "GCPChaos experiment."))
        .with_attribute("http_chaos", opt_nested(http_chaos_block(), "HTTPChaos experiment."))
        .with_attribute("io_chaos", opt_nested(io_chaos_block(), "IOChaos experiment."))
        .with_attribute("jvm_chaos", opt_nested(jvm_chaos_block(), "JVMChaos experiment."))
        .with_attribute(
            "kernel_chaos",
            opt_nested(kernel_chaos_block(), "KernelChaos experiment."),
        )
        .with_attribute(
            "network_chaos",
            opt_nested(network_chaos_block(), "NetworkChaos experiment."),
        )
        .with_attribute(
            "physicalmachine_chaos",
            opt_nested(physical_machine_chaos_block(), "PhysicalMachineChaos experiment."),
        )
        .with_attribute("pod_chaos", opt_nested(pod_chaos_block(), "PodChaos experiment."))
        .with_attribute(
            "stress_chaos",
            opt_nested(stress_chaos_block(), "StressChaos experiment."),
        )
        .with_attribute("time_chaos", opt_nested(time_chaos_block(), "TimeChaos experiment."))
}

fn aws_chaos_block() -> SchemaBlock {
    let block = SchemaBlock::new()
        .with_attribute(
            "action",
            req_string("Fault to inject.").one_of(&["ec2-stop", "ec2-restart", "detach-volume"]),
        )
        .with_attribute("aws_region", req_string("Region of the instance."))
        .with_attribute("ec2_instance", req_string("ID of the EC2 instance."))
        .with_attribute("secret_name", opt_string("Secret holding the AWS credentials."))
        .with_attribute("endpoint", opt_string("Custom AWS endpoint."))
        .with_attribute("device_name", opt_string("Device name, needed by detach-volume."))
        .with_attribute(
            "volume_id",
            opt_string("EBS volume ID, needed by detach-volume.").json_name("volumeID"),
        );
    with_common(block)
}

fn azure_chaos_block() -> SchemaBlock {
    let block = SchemaBlock::new()
        .with_attribute(
            "action",
            req_string("Fault to inject.").one_of(&["vm-stop", "vm-restart", "disk-detach"]),
        )
        .with_attribute(
            "subscription_id",
            req_string("Azure subscription ID.").json_name("subscriptionID"),
        )
        .with_attribute("resource_group_name", req_string("Resource group of the VM."))
        .with_attribute("vm_name", req_string("Name of the VM."))
        .with_attribute("disk_name", opt_string("Disk to detach, needed by disk-detach."))
        .with_attribute("lun", opt_int64("LUN of the disk, needed by disk-detach."))
        .with_attribute("secret_name", opt_string("Secret holding the Azure credentials."));
    with_common(block)
}

fn block_chaos_block() -> SchemaBlock {
    let delay = SchemaBlock::new()
        .with_attribute("latency", opt_string("Added latency."))
        .with_attribute("correlation", opt_string("Correlation with the previous latency."))
        .with_attribute("jitter", opt_string("Latency variation."));

    let block = SchemaBlock::new()
        .with_attribute("action", req_string("Fault to inject.").one_of(&["delay"]))
        .with_attribute("volume_name", req_string("Volume the block device backs."))
        .with_attribute("delay", opt_nested(delay, "Delay parameters."));
    with_common(with_container_selector(block))
}

fn dns_chaos_block() -> SchemaBlock {
    let block = SchemaBlock::new()
        .with_attribute("action", req_string("Fault to inject.").one_of(&["error", "random"]))
        .with_attribute(
            "patterns",
            opt_string_list("Domain templates to affect. Empty means every domain."),
        );
    with_common(with_container_selector(block))
}

fn gcp_chaos_block() -> SchemaBlock {
    let block = SchemaBlock::new()
        .with_attribute(
            "action",
            req_string("Fault to inject.").one_of(&["node-stop", "node-reset", "disk-loss"]),
        )
        .with_attribute("project", req_string("GCP project."))
        .with_attribute("zone", req_string("Zone of the instance."))
        .with_attribute("instance", req_string("Name of the instance."))
        .with_attribute("device_names", opt_string_list("Disks to detach, needed by disk-loss."))
        .with_attribute("secret_name", opt_string("Secret holding the GCP credentials."));
    with_common(block)
}

fn http_chaos_block() -> SchemaBlock {
    let replace = SchemaBlock::new()
        .with_attribute("path", opt_string("Replacement URI path."))
        .with_attribute("method", opt_string("Replacement method."))
        .with_attribute("code", opt_int64("Replacement status code."))
        .with_attribute("body", opt_string("Replacement body, base64 encoded."))
        .with_attribute("queries", opt_string_map("Query parameters to replace."))
        .with_attribute("headers", opt_string_map("Headers to replace."));

    let patch_body = SchemaBlock::new()
        .with_attribute("type", req_string("Patch type.").one_of(&["JSON"]))
        .with_attribute("value", req_string("Patch content."));

    let nested_list = SchemaAttribute::list(AttributeType::List(Box::new(AttributeType::String)));

    let patch = SchemaBlock::new()
        .with_attribute(
            "body",
            SchemaAttribute::single_nested(patch_body)
                .with_description("Body patch.")
                .optional(),
        )
        .with_attribute(
            "queries",
            nested_list
                .clone()
                .with_description("Query parameters to append, as key value pairs.")
                .optional(),
        )
        .with_attribute(
            "headers",
            nested_list
                .with_description("Headers to append, as key value pairs.")
                .optional(),
        );

    let tls = SchemaBlock::new()
        .with_attribute("secret_name", req_string("Secret holding the TLS material."))
        .with_attribute("secret_namespace", req_string("Namespace of the secret."))
        .with_attribute("cert_name", opt_string("Key of the certificate in the secret."))
        .with_attribute("key_name", opt_string("Key of the private key in the secret."))
        .with_attribute("ca_name", opt_string("Key of the CA certificate in the secret."));

    let block = SchemaBlock::new()
        .with_attribute(
            "target",
            req_string("Phase of the exchange to affect.").one_of(&["Request", "Response"]),
        )
        .with_attribute("port", req_int64("Target port.").between(1, 65535))
        .with_attribute("path", opt_string("URI path to match, supports wildcards."))
        .with_attribute("method", opt_string("HTTP method to match."))
        .with_attribute("code", opt_int64("Response status code to match."))
        .with_attribute(
            "request_headers",
            opt_string_map("Request headers to match.").json_name("request_headers"),
        )
        .with_attribute(
            "response_headers",
            opt_string_map("Response headers to match.").json_name("response_headers"),
        )
        .with_attribute("abort", opt_bool("Abort the connection."))
        .with_attribute("delay", opt_string("Delay before forwarding."))
        .with_attribute("replace", opt_nested(replace, "Replace actions."))
        .with_attribute("patch", opt_nested(patch, "Patch actions."))
        .with_attribute("tls", opt_nested(tls, "TLS configuration for HTTPS targets."));
    with_common(with_pod_selector(block))
}

fn io_chaos_block() -> SchemaBlock {
    let timespec = || {
        SchemaBlock::new()
            .with_attribute("sec", req_int64("Seconds."))
            .with_attribute("nsec", req_int64("Nanoseconds."))
    };

    let attr = SchemaBlock::new()
        .with_attribute("ino", opt_int64("Inode number."))
        .with_attribute("size", opt_int64("File size."))
        .with_attribute("blocks", opt_int64("Allocated blocks."))
        .with_attribute("perm", opt_int64("Permission bits."))
        .with_attribute("nlink", opt_int64("Hard link count."))
        .with_attribute("uid", opt_int64("Owner user ID."))
        .with_attribute("gid", opt_int64("Owner group ID."))
        .with_attribute("rdev", opt_int64("Device ID."))
        .with_attribute(
            "kind",
            opt_string("File type.").one_of(&[
                "namedPipe",
                "char",
                "block",
                "directory",
                "regular",
                "symlink",
                "socket",
            ]),
        )
        .with_attribute("atime", opt_nested(timespec(), "Access time."))
        .with_attribute("mtime", opt_nested(timespec(), "Modification time."))
        .with_attribute("ctime", opt_nested(timespec(), "Change time."));

    let mistake = SchemaBlock::new()
        .with_attribute(
            "filling",
            opt_string("What the wrong data is made of.").one_of(&["zero", "random"]),
        )
        .with_attribute(
            "max_occurrences",
            opt_int64("Maximum number of wrong data blocks.").at_least(1),
        )
        .with_attribute(
            "max_length",
            opt_int64("Maximum length of a wrong data block.").at_least(1),
        );

    let block = SchemaBlock::new()
        .with_attribute(
            "action",
            req_string("Fault to inject.").one_of(&["latency", "fault", "attrOverride", "mistake"]),
        )
        .with_attribute("volume_path", req_string("Mount path of the affected volume."))
        .with_attribute("path", opt_string("Files to affect, supports wildcards."))
        .with_attribute("delay", opt_string("Added latency, needed by latency."))
        .with_attribute("errno", opt_int64("Error number returned, needed by fault."))
        .with_attribute(
            "percent",
            opt_int64("Probability of injecting, in percent.").between(0, 100),
        )
        .with_attribute("methods", opt_string_list("File system calls to affect."))
        .with_attribute("attr", opt_nested(attr, "Attributes to override."))
        .with_attribute("mistake", opt_nested(mistake, "Wrong data to return."));
    with_common(with_container_selector(block))
}

fn jvm_chaos_block() -> SchemaBlock {
    let block = SchemaBlock::new()
        .with_attribute(
            "action",
            req_string("Fault to inject.").one_of(&[
                "latency",
                "return",
                "exception",
                "stress",
                "gc",
                "ruleData",
                "mysql",
            ]),
        )
        .with_attribute("class", opt_string("Java class to affect."))
        .with_attribute("method", opt_string("Method to affect."))
        .with_attribute("port", opt_int64("Port of the agent server.").between(1, 65535))
        .with_attribute("latency", opt_int64("Added latency in milliseconds."))
        .with_attribute("exception", opt_string("Exception to throw."))
        .with_attribute("cpu_count", opt_int64("CPU cores to burn.").at_least(1))
        .with_attribute(
            "mem_type",
            opt_string("Memory area to fill.").one_of(&["stack", "heap"]),
        )
        .with_attribute("rule_data", opt_string("Byteman rule."))
        .with_attribute("name", opt_string("Byteman rule name."))
        .with_attribute("pid", opt_int64("Java process ID."))
        .with_attribute("database", opt_string("MySQL database to match."))
        .with_attribute("table", opt_string("MySQL table to match."))
        .with_attribute(
            "sql_type",
            opt_string("SQL statement type to match.").one_of(&["select", "insert", "update", "delete", "replace"]),
        )
        .with_attribute(
            "mysql_connector_version",
            opt_string("MySQL connector major version.").one_of(&["5", "8"]),
        );
    with_common(with_container_selector(block))
}

fn kernel_chaos_block() -> SchemaBlock {
    let frame = SchemaBlock::new()
        .with_attribute("funcname", opt_string("Function name."))
        .with_attribute("parameters", opt_string("Function parameters."))
        .with_attribute("predicate", opt_string("Condition on the parameters."));

    let request = SchemaBlock::new()
        .with_attribute(
            "failtype",
            req_int64("0 fails slab allocation, 1 page allocation, 2 bio.").between(0, 2),
        )
        .with_attribute(
            "callchain",
            SchemaAttribute::list_nested(frame)
                .with_description("Call chain that must match.")
                .optional(),
        )
        .with_attribute("headers", opt_string_list("Extra headers for the fault injection."))
        .with_attribute(
            "probability",
            opt_int64("Probability of failing, in percent.").between(0, 100),
        )
        .with_attribute("times", opt_int64("Maximum number of failures.").at_least(0));

    let block = SchemaBlock::new().with_attribute(
        "fail_kern_request",
        SchemaAttribute::single_nested(request)
            .with_description("Kernel request to fail.")
            .required(),
    );
    with_common(with_container_selector(block))
}

fn network_chaos_block() -> SchemaBlock {
    let correlated = |field: &str, desc: &str| {
        SchemaBlock::new()
            .with_attribute(field, req_string(desc))
            .with_attribute("correlation", opt_string("Correlation with the previous packet."))
    };

    let reorder = SchemaBlock::new()
        .with_attribute("reorder", req_string("Percentage of packets reordered."))
        .with_attribute("correlation", opt_string("Correlation with the previous packet."))
        .with_attribute("gap", req_int64("Gap between reordered packets."));

    let delay = SchemaBlock::new()
        .with_attribute("latency", req_string("Added latency."))
        .with_attribute("jitter", opt_string("Latency variation."))
        .with_attribute("correlation", opt_string("Correlation with the previous packet."))
        .with_attribute("reorder", opt_nested(reorder, "Packet reordering."));

    let bandwidth = SchemaBlock::new()
        .with_attribute("rate", req_string("Rate limit, such as '1mbps'."))
        .with_attribute("limit", req_int64("Bytes that can be queued.").at_least(1))
        .with_attribute("buffer", req_int64("Bucket size in bytes.").at_least(1))
        .with_attribute("peakrate", opt_int64("Maximum depletion rate of the bucket.").at_least(0))
        .with_attribute("minburst", opt_int64("Size of the peakrate bucket.").at_least(0));

    let rate = SchemaBlock::new().with_attribute("rate", req_string("Rate limit, such as '1mbps'."));

    let block = SchemaBlock::new()
        .with_attribute(
            "action",
            req_string("Fault to inject.").one_of(&[
                "netem",
                "delay",
                "loss",
                "duplicate",
                "corrupt",
                "partition",
                "bandwidth",
            ]),
        )
        .with_attribute(
            "direction",
            opt_string("Direction of the affected traffic.").one_of(&["to", "from", "both"]),
        )
        .with_attribute(
            "target",
            opt_nested(with_pod_selector(SchemaBlock::new()), "Pods on the other side of the link."),
        )
        .with_attribute(
            "external_targets",
            opt_string_list("Hosts or CIDRs outside the cluster on the other side of the link."),
        )
        .with_attribute("device", opt_string("Network interface to affect."))
        .with_attribute("target_device", opt_string("Network interface of the target pods."))
        .with_attribute("delay", opt_nested(delay, "Delay parameters."))
        .with_attribute(
            "loss",
            opt_nested(correlated("loss", "Percentage of packets lost."), "Loss parameters."),
        )
        .with_attribute(
            "duplicate",
            opt_nested(
                correlated("duplicate", "Percentage of packets duplicated."),
                "Duplication parameters.",
            ),
        )
        .with_attribute(
            "corrupt",
            opt_nested(
                correlated("corrupt", "Percentage of packets corrupted."),
                "Corruption parameters.",
            ),
        )
        .with_attribute("bandwidth", opt_nested(bandwidth, "Bandwidth limit."))
        .with_attribute("rate", opt_nested(rate, "Rate limit."));
    with_common(with_pod_selector(block))
}

fn physical_machine_chaos_block() -> SchemaBlock {
    let selector = SchemaBlock::new()
        .with_attribute("namespaces", opt_string_list("Namespaces of the PhysicalMachine objects."))
        .with_attribute(
            "physical_machines",
            SchemaAttribute::map(AttributeType::List(Box::new(AttributeType::String)))
                .with_description("PhysicalMachine names per namespace.")
                .optional(),
        )
        .with_attribute("label_selectors", opt_string_map("Label selector."))
        .with_attribute("annotation_selectors", opt_string_map("Annotation selector."))
        .with_attribute("field_selectors", opt_string_map("Field selector."))
        .with_attribute("expression_selectors", expression_selectors_attribute());

    let stress_cpu = SchemaBlock::new()
        .with_attribute("load", opt_int64("Percent of each worker's CPU to use.").between(0, 100))
        .with_attribute("workers", opt_int64("Number of workers.").at_least(1))
        .with_attribute("options", opt_string_list("Extra stress-ng options."));

    let stress_mem = SchemaBlock::new()
        .with_attribute("size", opt_string("Memory to allocate, such as '256MB' or '25%'."))
        .with_attribute("options", opt_string_list("Extra stress-ng options."));

    let disk_fill = SchemaBlock::new()
        .with_attribute("size", opt_string("Amount of data to write."))
        .with_attribute("path", opt_string("File to fill."))
        .with_attribute(
            "fill_by_fallocate",
            opt_bool("Use fallocate instead of dd.").json_name("fill-by-fallocate"),
        );

    let network_target = |block: SchemaBlock| {
        block
            .with_attribute("device", opt_string("Network interface."))
            .with_attribute("hostname", opt_string("Host name to affect."))
            .with_attribute(
                "ip_address",
                opt_string("IP address or CIDR to affect.").json_name("ip-address"),
            )
            .with_attribute(
                "ip_protocol",
                opt_string("Protocol to affect.")
                    .one_of(&["tcp", "udp", "icmp", "all"])
                    .json_name("ip-protocol"),
            )
            .with_attribute(
                "source_port",
                opt_string("Source ports to affect.").json_name("source-port"),
            )
            .with_attribute(
                "egress_port",
                opt_string("Destination ports to affect.").json_name("egress-port"),
            )
            .with_attribute("correlation", opt_string("Correlation with the previous packet."))
    };

    let network_delay = network_target(SchemaBlock::new())
        .with_attribute("latency", opt_string("Added latency."))
        .with_attribute("jitter", opt_string("Latency variation."))
        .with_attribute(
            "accept_tcp_flags",
            opt_string("Only affect TCP packets with these flags.").json_name("accept-tcp-flags"),
        );

    let network_loss = network_target(SchemaBlock::new())
        .with_attribute("percent", opt_string("Percentage of packets lost."));

    let process = SchemaBlock::new()
        .with_attribute("process", opt_string("Process name or PID."))
        .with_attribute("signal", opt_int64("Signal to send."))
        .with_attribute(
            "recover_cmd",
            opt_string("Command run when recovering.").json_name("recover-cmd"),
        );

    let clock = SchemaBlock::new()
        .with_attribute("pid", opt_int64("Process to affect."))
        .with_attribute(
            "time_offset",
            opt_string("Offset applied to the clock.").json_name("time-offset"),
        )
        .with_attribute(
            "clock_ids_slice",
            opt_string("Comma separated clock IDs.").json_name("clock-ids-slice"),
        );

    SchemaBlock::new()
        .with_attribute("action", req_string("Fault to inject.").one_of(PHYSICAL_MACHINE_ACTIONS))
        .with_attribute("mode", req_string("How targets are picked from the selection.").one_of(MODES))
        .with_attribute(
            "value",
            opt_string("Parameter of fixed, fixed-percent and random-max-percent modes."),
        )
        .with_attribute(
            "address",
            opt_string_list("Chaosd addresses, used instead of the selector."),
        )
        .with_attribute("selector", opt_nested(selector, "Selects PhysicalMachine objects."))
        .with_attribute(
            "stress_cpu",
            opt_nested(stress_cpu, "CPU stress.").json_name("stress-cpu"),
        )
        .with_attribute(
            "stress_mem",
            opt_nested(stress_mem, "Memory stress.").json_name("stress-mem"),
        )
        .with_attribute(
            "disk_fill",
            opt_nested(disk_fill, "Disk fill.").json_name("disk-fill"),
        )
        .with_attribute(
            "network_delay",
            opt_nested(network_delay, "Network delay.").json_name("network-delay"),
        )
        .with_attribute(
            "network_loss",
            opt_nested(network_loss, "Network loss.").json_name("network-loss"),
        )
        .with_attribute("process", opt_nested(process, "Process kill."))
        .with_attribute("clock", opt_nested(clock, "Clock skew."))
        .with_attribute("duration", opt_string("How long the chaos lasts."))
        .with_attribute("remote_cluster", opt_string("Cluster the chaos is injected into."))
}

fn pod_chaos_block() -> SchemaBlock {
    let block = SchemaBlock::new()
        .with_attribute(
            "action",
            req_string("Fault to inject.").one_of(&["pod-kill", "pod-failure", "container-kill"]),
        )
        .with_attribute(
            "grace_period",
            opt_int64("Seconds before a killed pod is deleted, for pod-kill.").at_least(0),
        );
    with_common(with_container_selector(block))
}

fn stress_chaos_block() -> SchemaBlock {
    let cpu = SchemaBlock::new()
        .with_attribute("workers", req_int64("Number of workers.").between(1, 8192))
        .with_attribute("load", opt_int64("Percent of each worker's CPU to use.").between(0, 100))
        .with_attribute("options", opt_string_list("Extra stress-ng options."));

    let memory = SchemaBlock::new()
        .with_attribute("workers", req_int64("Number of workers.").between(1, 8192))
        .with_attribute("size", opt_string("Memory to allocate, such as '256MB' or '25%'."))
        .with_attribute(
            "oom_score_adj",
            opt_int64("OOM score adjustment of the stress process.").between(-1000, 1000),
        )
        .with_attribute("options", opt_string_list("Extra stress-ng options."));

    let stressors = SchemaBlock::new()
        .with_attribute("cpu", opt_nested(cpu, "CPU stressor."))
        .with_attribute("memory", opt_nested(memory, "Memory stressor."));

    let block = SchemaBlock::new()
        .with_attribute("stressors", opt_nested(stressors, "Built-in stressors."))
        .with_attribute(
            "stressng_stressors",
            opt_string("Raw stress-ng arguments, used instead of stressors."),
        );
    with_common(with_container_selector(block))
}

fn time_chaos_block() -> SchemaBlock {
    let block = SchemaBlock::new()
        .with_attribute("time_offset", req_string("Offset applied to the clock, such as '-5m'."))
        .with_attribute(
            "clock_ids",
            opt_string_list("Clocks to affect, such as CLOCK_REALTIME."),
        );
    with_common(with_container_selector(block))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_and_schedules_share_chaos_variants() {
        let spec = spec_attribute();
        let spec_block = &spec.nested_type.as_ref().unwrap().block;
        let template = &spec_block.attributes["templates"].nested_type.as_ref().unwrap().block;
        let schedule = &template.attributes["schedule"].nested_type.as_ref().unwrap().block;

        for variant in ["aws_chaos", "network_chaos", "physicalmachine_chaos", "time_chaos"] {
            assert!(template.attributes.contains_key(variant));
            assert!(schedule.attributes.contains_key(variant));
        }
        assert!(!schedule.attributes.contains_key("schedule_type"));
    }

    #[test]
    fn test_metadata_replacement_modifiers() {
        let metadata = metadata_attribute();
        let block = &metadata.nested_type.as_ref().unwrap().block;

        for field in ["name", "namespace"] {
            assert!(block.attributes[field]
                .plan_modifiers
                .contains(&PlanModifier::RequiresReplace));
        }
        assert!(block.attributes["labels"].plan_modifiers.is_empty());
    }

    #[test]
    fn test_physical_machine_kebab_case_wire_names() {
        let block = physical_machine_chaos_block();
        assert_eq!(block.attributes["stress_cpu"].json_key("stress_cpu"), "stress-cpu");
        assert_eq!(block.attributes["remote_cluster"].json_key("remote_cluster"), "remoteCluster");
    }

    #[test]
    fn test_unbounded_integer_fields_reject_fractions() {
        let spec = spec_attribute();
        let block = &spec.nested_type.as_ref().unwrap().block;
        let config = serde_json::json!({
            "entry": "io",
            "templates": [
                {
                    "name": "io",
                    "template_type": "IOChaos",
                    "io_chaos": {
                        "action": "fault",
                        "mode": "one",
                        "selector": {"namespaces": ["app"]},
                        "volume_path": "/data",
                        "errno": 1.5
                    }
                },
                {
                    "name": "disk",
                    "template_type": "AzureChaos",
                    "azure_chaos": {
                        "action": "disk-detach",
                        "subscription_id": "sub",
                        "resource_group_name": "rg",
                        "vm_name": "vm",
                        "lun": 2
                    }
                }
            ]
        });

        let diags = block.validate(&config);

        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].summary, "Incorrect attribute value type");
        assert_eq!(
            diags[0].attribute.as_deref(),
            Some(
                &[
                    "templates".to_string(),
                    "0".to_string(),
                    "io_chaos".to_string(),
                    "errno".to_string()
                ][..]
            )
        );
    }
}

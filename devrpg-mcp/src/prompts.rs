//! Per-kind prompts
//!
//! Each [`AnalysisProfile`] pairs a system prompt with an analysis template
//! whose JSON shape matches the kind's sub-report fields.

use devrpg_common::AnalysisKind;
use std::fmt::Write;

use crate::service::CodeAnalysisRequest;

const JSON_ONLY: &str = "You must ALWAYS respond with valid JSON only, no other text.";

const CODE_QUALITY_SYSTEM: &str = "You are an expert code reviewer focused on clean code. \
Find the quality problems in the code you are given.";

const CODE_QUALITY_PROMPT: &str = r#"Review this code for clean code violations and quality problems.

Look for:
1. Poor naming of variables, functions and types
2. Functions that are too long or too complex
3. Duplicated code
4. Magic numbers and strings
5. Missing or incorrect error handling
6. Missing or misleading comments
7. Single Responsibility Principle violations
8. Dead code and unused variables
9. Deeply nested conditionals and loops
10. Broken encapsulation

Answer with a JSON object of exactly this shape:
{
    "score": <0-100, 100 is flawless>,
    "issues": [
        {
            "type": "<issue type>",
            "severity": "<low|medium|high|critical>",
            "line": <line number or null>,
            "message": "<what is wrong>",
            "suggestion": "<how to fix it>"
        }
    ],
    "summary": "<short overall verdict>"
}"#;

const ARCHITECTURE_SYSTEM: &str = "You are an expert software architect versed in clean \
architecture, SOLID and dependency management. Find the structural problems in the code you \
are given.";

const ARCHITECTURE_PROMPT: &str = r#"Review this code's architecture, imports and structure.
Find circular dependencies, layer violations and architectural anti-patterns.

Look for:
1. Circular dependencies between modules
2. Layer violations, such as data access importing presentation code
3. Dependencies pointing outward instead of inward
4. Missing abstractions or interfaces
5. God modules with too many responsibilities
6. Tight coupling between components
7. Unused or unnecessary imports
8. Poorly grouped imports

Typical layers: presentation (controllers, views), application (use cases,
services), domain (entities, value objects), infrastructure (database, I/O,
external services).

Answer with a JSON object of exactly this shape:
{
    "architecture_score": <0-100>,
    "detected_layers": [
        {
            "name": "<layer name>",
            "imports": ["<imported module>"]
        }
    ],
    "dependency_issues": [
        {
            "type": "<circular_dependency|layer_violation|unused_import|tight_coupling>",
            "severity": "<low|medium|high|critical>",
            "source": "<source module>",
            "target": "<target module or null>",
            "message": "<what is wrong>",
            "suggestion": "<how to fix it>"
        }
    ],
    "circular_dependencies": ["<A -> B -> A>"],
    "layer_violations": ["<violation>"],
    "summary": "<overall verdict>",
    "recommendations": ["<improvement>"]
}"#;

const EVENT_LOOP_SYSTEM: &str = "You are an expert in asynchronous programming, event loops \
and non-blocking I/O in Node.js and Python. Find the operations that block the event loop.";

const EVENT_LOOP_PROMPT: &str = r#"Find the operations in this code that would block the event loop.

Node.js:
- synchronous fs calls (readFileSync, writeFileSync)
- synchronous crypto (pbkdf2Sync and friends)
- child_process execSync and spawnSync
- long CPU-bound loops and calculations
- database calls that are not awaited
- JSON.parse or JSON.stringify on large payloads
- regular expressions prone to catastrophic backtracking

Python asyncio:
- time.sleep() instead of asyncio.sleep()
- requests instead of an async HTTP client
- plain open() inside coroutines
- subprocess.run() instead of asyncio.subprocess
- CPU-heavy work not moved to an executor
- blocking sockets or other blocking I/O in async functions

Answer with a JSON object of exactly this shape:
{
    "event_loop_score": <0-100, 100 means nothing blocks>,
    "blocking_operations": [
        {
            "type": "<sync_io|cpu_bound|blocking_call|regex_backtrack|sync_crypto>",
            "severity": "<low|medium|high|critical>",
            "line": <line number or null>,
            "operation": "<the blocking call>",
            "blocking_time_estimate": "<estimated duration>",
            "message": "<why it blocks>",
            "async_alternative": "<non-blocking replacement>"
        }
    ],
    "total_blocking_calls": <count>,
    "estimated_freeze_risk": "<none|low|medium|high|critical>",
    "async_patterns_used": ["<async pattern found>"],
    "summary": "<overall verdict>",
    "recommendations": ["<improvement>"]
}"#;

const COST_SYSTEM: &str = "You are an expert in algorithm analysis, computational complexity \
and cloud cost optimization. Estimate Big-O complexity and cloud resource usage accurately.";

const COST_PROMPT: &str = r#"Estimate this code's Big-O complexity and its likely cloud cost impact.

Complexity:
1. List every function or method
2. Give its time complexity
3. Give its space complexity
4. Flag performance hotspots
5. Account for nested loops, recursion and data structure operations

Cost factors:
- compute: CPU-heavy work, iteration counts, recursion
- memory: large structures, caches, in-memory processing
- network: outbound calls and data transfer
- storage: file writes, database writes, logging
- api_calls: external services and database queries

Impact levels: Low for O(1) to O(log n), Medium for O(n) to O(n log n),
High for O(n^2) and worse.

Answer with a JSON object of exactly this shape:
{
    "efficiency_score": <0-100, 100 is most efficient>,
    "overall_time_complexity": "<dominant Big-O>",
    "overall_space_complexity": "<dominant Big-O>",
    "complexity_breakdown": [
        {
            "function_name": "<name>",
            "time_complexity": "<O(?)>",
            "space_complexity": "<O(?)>",
            "explanation": "<reasoning>",
            "hotspot": <true if performance critical>
        }
    ],
    "cloud_cost_impact": "<Low|Medium|High>",
    "cost_factors": [
        {
            "category": "<compute|memory|network|storage|api_calls>",
            "impact": "<Low|Medium|High>",
            "description": "<cost driver>",
            "optimization": "<how to reduce it>"
        }
    ],
    "estimated_monthly_impact": "<rough estimate such as '$10-50' or 'Minimal'>",
    "scalability_assessment": "<behaviour as data grows>",
    "summary": "<overall verdict>",
    "optimizations": ["<cost reduction>"]
}"#;

/// Prompts and descriptor text for one analysis kind
#[derive(Debug, Clone, Copy)]
pub struct AnalysisProfile {
    pub kind: AnalysisKind,
    /// One-line description served by `GET /`
    pub description: &'static str,
    system: &'static str,
    template: &'static str,
}

impl AnalysisProfile {
    pub fn for_kind(kind: AnalysisKind) -> Self {
        let (description, system, template) = match kind {
            AnalysisKind::CodeQuality => (
                "AI-powered code quality analysis",
                CODE_QUALITY_SYSTEM,
                CODE_QUALITY_PROMPT,
            ),
            AnalysisKind::Architecture => (
                "AI-powered architecture and dependency analysis",
                ARCHITECTURE_SYSTEM,
                ARCHITECTURE_PROMPT,
            ),
            AnalysisKind::EventLoop => (
                "AI-powered event loop blocking detection",
                EVENT_LOOP_SYSTEM,
                EVENT_LOOP_PROMPT,
            ),
            AnalysisKind::Cost => (
                "AI-powered Big-O complexity and cloud cost estimation",
                COST_SYSTEM,
                COST_PROMPT,
            ),
        };

        Self {
            kind,
            description,
            system,
            template,
        }
    }

    /// System prompt, ending with the JSON-only instruction
    pub fn system_prompt(&self) -> String {
        format!("{}\n{}", self.system, JSON_ONLY)
    }

    /// Optional request context appended to the template
    ///
    /// Each kind reads only the fields it understands.
    pub fn context(&self, request: &CodeAnalysisRequest) -> String {
        let mut context = String::new();
        match self.kind {
            AnalysisKind::Architecture => {
                if let Some(structure) = non_blank(&request.project_structure) {
                    let _ = write!(context, "\n\nProject structure:\n{}", structure);
                }
            }
            AnalysisKind::EventLoop => {
                if let Some(runtime) = non_blank(&request.runtime) {
                    let _ = write!(context, "\n\nTarget runtime: {}", runtime);
                }
            }
            AnalysisKind::Cost => {
                if let Some(size) = non_blank(&request.expected_data_size) {
                    let _ = write!(context, "\n\nExpected data size: {}", size);
                }
                if let Some(provider) = non_blank(&request.cloud_provider) {
                    let _ = write!(context, "\nTarget cloud provider: {}", provider);
                }
            }
            AnalysisKind::CodeQuality => {}
        }
        context
    }

    /// Full user prompt for `request`
    pub fn build_prompt(&self, request: &CodeAnalysisRequest) -> String {
        let language_hint = non_blank(&request.language)
            .map(|language| format!(" (Language: {})", language))
            .unwrap_or_default();

        format!(
            "{template}{context}\n\n\
             IMPORTANT: respond with ONLY valid JSON. No explanations and no markdown outside the JSON.\n\n\
             Code to analyze{language_hint}:\n\
             ```\n{code}\n```\n\n\
             Respond with valid JSON only:",
            template = self.template,
            context = self.context(request),
            language_hint = language_hint,
            code = request.code,
        )
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(code: &str) -> CodeAnalysisRequest {
        CodeAnalysisRequest {
            code: code.to_string(),
            ..CodeAnalysisRequest::default()
        }
    }

    #[test]
    fn test_prompt_names_the_kind_score_field() {
        for kind in AnalysisKind::ALL {
            let prompt = AnalysisProfile::for_kind(kind).build_prompt(&request("x = 1"));
            assert!(
                prompt.contains(&format!("\"{}\"", kind.score_field())),
                "{} prompt lacks its score field",
                kind
            );
        }
    }

    #[test]
    fn test_prompt_fences_code_and_hints_language() {
        let mut req = request("def f():\n    return 1");
        req.language = Some("python".to_string());

        let prompt = AnalysisProfile::for_kind(AnalysisKind::CodeQuality).build_prompt(&req);
        assert!(prompt.contains("Code to analyze (Language: python):"));
        assert!(prompt.contains("```\ndef f():\n    return 1\n```"));
        assert!(prompt.ends_with("Respond with valid JSON only:"));
    }

    #[test]
    fn test_context_only_for_fields_the_kind_reads() {
        let req = CodeAnalysisRequest {
            code: "x".to_string(),
            project_structure: Some("src/\n  api/\n  db/".to_string()),
            runtime: Some("node".to_string()),
            expected_data_size: Some("large".to_string()),
            cloud_provider: Some("AWS".to_string()),
            ..CodeAnalysisRequest::default()
        };

        let architect = AnalysisProfile::for_kind(AnalysisKind::Architecture).context(&req);
        assert_eq!(architect, "\n\nProject structure:\nsrc/\n  api/\n  db/");

        let event_loop = AnalysisProfile::for_kind(AnalysisKind::EventLoop).context(&req);
        assert_eq!(event_loop, "\n\nTarget runtime: node");

        let cost = AnalysisProfile::for_kind(AnalysisKind::Cost).context(&req);
        assert_eq!(cost, "\n\nExpected data size: large\nTarget cloud provider: AWS");

        assert!(AnalysisProfile::for_kind(AnalysisKind::CodeQuality)
            .context(&req)
            .is_empty());
    }

    #[test]
    fn test_blank_context_is_skipped() {
        let mut req = request("x");
        req.runtime = Some("  ".to_string());
        assert!(AnalysisProfile::for_kind(AnalysisKind::EventLoop)
            .context(&req)
            .is_empty());
    }

    #[test]
    fn test_system_prompt_demands_json() {
        let system = AnalysisProfile::for_kind(AnalysisKind::Cost).system_prompt();
        assert!(system.ends_with(JSON_ONLY));
    }
}

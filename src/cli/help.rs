pub const USAGE_MSG: &str = "Usage: tsh [-hvpV] [-r <dir>]";

const DESCRIPTOR: &str = "A tiny shell with job control.
After logging in, runs one program or builtin per line; end a line with & to run it in the background.";

const HELP_MSG: &str = "Options:
-v, --verbose                   print additional diagnostic information
-p, --no-prompt                 do not emit a command prompt
-r, --root <dir>                directory holding etc/, home/ and proc/ (default: .)

-h, --help                      display this help
-V, --version                   display version

Builtins:
jobs                            list the active jobs
fg <%jid|pid>, bg <%jid|pid>    resume a job in the foreground or background
history, !<n>                   list or re-run one of the last 10 commands
adduser <user> <password>       create a new user (root only)
quit [-f], logout               leave the shell; -f ignores suspended jobs
";

pub fn long_help_message() -> String {
    format!("{USAGE_MSG}\n\n{DESCRIPTOR}\n\n{HELP_MSG}")
}

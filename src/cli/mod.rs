use std::{mem, path::PathBuf};

pub mod help;


#[cfg_attr(test, derive(Debug, PartialEq, Clone))]
pub enum TshAction {
    Help,
    Version,
    Run(TshRunOptions),
}

impl TshAction {
    pub fn from_env() -> Result<Self, String> {
        TshOptions::parse_arguments(std::env::args())?.validate()
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(test, derive(PartialEq))]
pub struct TshRunOptions {
    // -v
    pub verbose: bool,
    // -p
    pub emit_prompt: bool,
    // -r
    pub root: PathBuf,
}

impl Default for TshRunOptions {
    fn default() -> Self {
        Self {
            verbose: false,
            emit_prompt: true,
            root: PathBuf::from("."),
        }
    }
}

impl TryFrom<TshOptions> for TshRunOptions {
    type Error = String;

    fn try_from(mut opts: TshOptions) -> Result<Self, Self::Error> {
        let verbose = mem::take(&mut opts.verbose);
        let no_prompt = mem::take(&mut opts.no_prompt);
        let root = mem::take(&mut opts.root);

        reject_all("run mode", opts)?;

        Ok(Self {
            verbose,
            emit_prompt: !no_prompt,
            root: root.unwrap_or_else(|| PathBuf::from(".")),
        })
    }
}

fn reject_all(context: &str, opts: TshOptions) -> Result<(), String> {
    macro_rules! ensure_options_absent {
        ($($opt:ident,)*) => {
            let TshOptions {
                $($opt),*
            } = opts;

            $(if !$opt.is_absent() {
                let name = concat!("--", stringify!($opt)).replace('_', "-");
                return Err(format!("{context} conflicts with {name}"));
            })*
        };
    }

    ensure_options_absent! {
        help,
        no_prompt,
        root,
        verbose,
        version,
        positional_args,
    };

    if !positional_args.is_absent() {
        return Err(format!("{context} conflicts with positional argument"));
    }

    Ok(())
}

trait IsAbsent {
    fn is_absent(&self) -> bool;
}

impl IsAbsent for bool {
    fn is_absent(&self) -> bool {
        !*self
    }
}

impl<T> IsAbsent for Option<T> {
    fn is_absent(&self) -> bool {
        self.is_none()
    }
}

impl<T> IsAbsent for Vec<T> {
    fn is_absent(&self) -> bool {
        self.is_empty()
    }
}

#[derive(Debug, Default, PartialEq)]
pub(crate) struct TshOptions {
    // -h
    help: bool,
    // -p
    no_prompt: bool,
    // -r
    root: Option<PathBuf>,
    // -v
    verbose: bool,
    // -V
    version: bool,

    positional_args: Vec<String>,
}

type OptionSetter = fn(&mut TshOptions, Option<String>) -> Result<(), String>;

struct TshOption {
    short: char,
    long: &'static str,
    takes_argument: bool,
    set: OptionSetter,
}

impl TshOptions {
    const TSH_OPTIONS: &'static [TshOption] = &[
        TshOption {
            short: 'h',
            long: "help",
            takes_argument: false,
            set: |options, _| {
                if options.help {
                    Err(more_than_once("--help"))
                } else {
                    options.help = true;
                    Ok(())
                }
            },
        },
        TshOption {
            short: 'p',
            long: "no-prompt",
            takes_argument: false,
            set: |options, _| {
                if options.no_prompt {
                    Err(more_than_once("--no-prompt"))
                } else {
                    options.no_prompt = true;
                    Ok(())
                }
            },
        },
        TshOption {
            short: 'r',
            long: "root",
            takes_argument: true,
            set: |options, argument| {
                if options.root.is_some() {
                    Err(more_than_once("--root"))
                } else if let Some(path) = argument.filter(|path| !path.is_empty()) {
                    options.root = Some(PathBuf::from(path));
                    Ok(())
                } else {
                    Err("no root directory provided".into())
                }
            },
        },
        TshOption {
            short: 'v',
            long: "verbose",
            takes_argument: false,
            set: |options, _| {
                if options.verbose {
                    Err(more_than_once("--verbose"))
                } else {
                    options.verbose = true;
                    Ok(())
                }
            },
        },
        TshOption {
            short: 'V',
            long: "version",
            takes_argument: false,
            set: |options, _| {
                if options.version {
                    Err(more_than_once("--version"))
                } else {
                    options.version = true;
                    Ok(())
                }
            },
        },
    ];

    /// parse tsh arguments into TshOptions struct
    pub(crate) fn parse_arguments(
        arguments: impl IntoIterator<Item = String>,
    ) -> Result<TshOptions, String> {
        let mut options: TshOptions = TshOptions::default();
        let mut arg_iter = arguments.into_iter().skip(1);

        while let Some(arg) = arg_iter.next() {
            if arg == "--" {
                // only positional arguments after this point
                options.positional_args.extend(arg_iter);

                break;

                // if the argument starts with -- it must be a full length option name
            } else if let Some(unprefixed) = arg.strip_prefix("--") {
                // parse assignments like '--root=/srv/tsh'
                if let Some((key, value)) = unprefixed.split_once('=') {
                    if let Some(option) = Self::TSH_OPTIONS.iter().find(|o| o.long == key) {
                        if option.takes_argument {
                            (option.set)(&mut options, Some(value.to_string()))?;
                        } else {
                            Err(format!("'--{}' does not take any arguments", option.long))?;
                        }
                    } else {
                        Err(format!("unrecognized option '{arg}'"))?;
                    }
                } else if let Some(option) =
                    Self::TSH_OPTIONS.iter().find(|o| o.long == unprefixed)
                {
                    if option.takes_argument {
                        let next_arg = arg_iter.next();
                        (option.set)(&mut options, next_arg)?;
                    } else {
                        (option.set)(&mut options, None)?;
                    }
                } else {
                    Err(format!("unrecognized option '{arg}'"))?;
                }
            } else if let Some(unprefixed) = arg.strip_prefix('-') {
                // flags can be grouped, so we loop over the the characters
                let mut chars = unprefixed.chars();
                while let Some(curr) = chars.next() {
                    if let Some(option) = Self::TSH_OPTIONS.iter().find(|o| o.short == curr) {
                        // the argument is either the rest of the current flag group or the next argument
                        let rest = chars.as_str();

                        if option.takes_argument {
                            let next_arg = if rest.is_empty() {
                                arg_iter.next()
                            } else {
                                Some(rest.to_string())
                            };
                            (option.set)(&mut options, next_arg)?;
                            break;
                        } else {
                            (option.set)(&mut options, None)?;
                        }
                    } else {
                        Err(format!("unrecognized option '{curr}'"))?;
                    }
                }
            } else {
                options.positional_args.push(arg);
            }
        }

        Ok(options)
    }

    pub(crate) fn validate(mut self) -> Result<TshAction, String> {
        let action = if self.help {
            self.help = false;
            reject_all("--help", self)?;
            TshAction::Help
        } else if self.version {
            self.version = false;
            reject_all("--version", self)?;
            TshAction::Version
        } else {
            TshAction::Run(self.try_into()?)
        };
        Ok(action)
    }
}

fn more_than_once(flag: &str) -> String {
    format!("argument '{flag}' was provided more than once, but cannot be used multiple times")
}

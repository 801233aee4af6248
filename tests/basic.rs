use structopt::StructOpt;

macro_rules! assert_match {
    ($a:expr => $b:pat) => {
        assert!(match $a {
            $b => true,
            _ => false,
        });
    };
}

#[test]
fn run_with_no_args() {
    let args = [""];
    let res = rjudge::Opt::from_iter_safe(&args);
    assert_match!(res => Err(_));
}

#[test]
fn parse_submit() {
    let args = ["rjudge", "submit", "1200A", "54", "main.cpp", "--wait"];
    let res = rjudge::Opt::from_iter_safe(&args);
    assert_match!(res => Ok(_));
}

#[test]
fn submit_requires_source() {
    let args = ["rjudge", "submit", "1200A", "54"];
    let res = rjudge::Opt::from_iter_safe(&args);
    assert_match!(res => Err(_));
}

#[test]
fn parse_global_options_after_subcommand() {
    let args = ["rjudge", "status", "176856006", "-w", "--output", "yaml", "-y"];
    let res = rjudge::Opt::from_iter_safe(&args);
    assert_match!(res => Ok(_));
}

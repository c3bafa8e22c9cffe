pub mod alb_https_redirection;
pub mod iam_role_not_used;
